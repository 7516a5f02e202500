//! Connection and session configuration.

use crate::error::{OrmError, OrmResult};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Credentials and location of the database a connection is opened against.
///
/// Can be built in code, read from the environment (`RECORM_*` variables), or
/// loaded from the `[database]` table of a TOML file:
///
/// ```toml
/// [database]
/// driver = "pgsql"
/// host = "localhost"
/// database = "blog"
/// user = "blog"
/// password = "secret"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    /// Driver-name token, e.g. `pgsql` or `mysql`.
    pub driver: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    pub database: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Unix socket DSN prefix; takes precedence over `host` when set.
    #[serde(default)]
    pub socket: Option<String>,
    /// Complete connection URL; takes precedence over every other field when opening
    /// a Postgres connection.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    database: ConnectionConfig,
}

impl ConnectionConfig {
    pub fn new(driver: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn socket(mut self, socket: impl Into<String>) -> Self {
        self.socket = Some(socket.into());
        self
    }

    /// Read configuration from `RECORM_*` environment variables.
    ///
    /// `DATABASE_URL`, when set, is kept as [`ConnectionConfig::url`] and the driver
    /// defaults to `pgsql`.
    pub fn from_env() -> OrmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OrmResult<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let url = non_empty("DATABASE_URL");
        let driver = non_empty("RECORM_DRIVER").or_else(|| url.as_ref().map(|_| "pgsql".into()));
        let port = match non_empty("RECORM_PORT") {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .map_err(|e| OrmError::config(format!("RECORM_PORT '{raw}': {e}")))?,
            ),
            None => None,
        };

        let config = Self {
            driver: driver.unwrap_or_default(),
            host: non_empty("RECORM_HOST"),
            port,
            database: non_empty("RECORM_DATABASE").unwrap_or_default(),
            user: non_empty("RECORM_USER"),
            password: lookup("RECORM_PASSWORD"),
            socket: non_empty("RECORM_SOCKET"),
            url,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse the `[database]` table of a TOML document.
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        let file: ConfigFile =
            toml::from_str(raw).map_err(|e| OrmError::config(format!("invalid TOML: {e}")))?;
        file.database.validate()?;
        Ok(file.database)
    }

    /// Load the `[database]` table from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OrmError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> OrmResult<()> {
        if self.url.is_some() {
            return Ok(());
        }
        if self.driver.is_empty() {
            return Err(OrmError::config("driver must be set"));
        }
        if self.database.is_empty() {
            return Err(OrmError::config("database must be set"));
        }
        if self.host.is_none() && self.socket.is_none() {
            return Err(OrmError::config("either host or socket must be set"));
        }
        Ok(())
    }

    /// DSN in `driver:host=...;dbname=...` form, or `socket;dbname=...` when a socket
    /// is configured.
    pub fn dsn(&self) -> String {
        match (&self.socket, &self.host) {
            (Some(socket), _) => format!("{socket};dbname={}", self.database),
            (None, host) => {
                let mut dsn = format!("{}:host={}", self.driver, host.as_deref().unwrap_or(""));
                if let Some(port) = self.port {
                    dsn.push_str(&format!(";port={port}"));
                }
                dsn.push_str(&format!(";dbname={}", self.database));
                dsn
            }
        }
    }

    /// Key-value connection string understood by tokio-postgres.
    pub fn postgres_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let mut parts = Vec::new();
        match (&self.socket, &self.host) {
            (Some(socket), _) => parts.push(format!("host={}", quote_kv(socket))),
            (None, Some(host)) => parts.push(format!("host={}", quote_kv(host))),
            (None, None) => {}
        }
        if let Some(port) = self.port {
            parts.push(format!("port={port}"));
        }
        parts.push(format!("dbname={}", quote_kv(&self.database)));
        if let Some(user) = &self.user {
            parts.push(format!("user={}", quote_kv(user)));
        }
        if let Some(password) = &self.password {
            parts.push(format!("password={}", quote_kv(password)));
        }
        parts.join(" ")
    }
}

fn quote_kv(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Whether to log statements through `tracing`.
    pub logging_enabled: bool,
    /// Minimum duration to log (filters out fast queries).
    pub log_min_duration: Option<Duration>,
    /// Slow query threshold for alerting.
    pub slow_query_threshold: Option<Duration>,
    /// Truncate logged SQL to this many bytes.
    pub max_sql_length: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            logging_enabled: true,
            log_min_duration: None,
            slow_query_threshold: None,
            max_sql_length: Some(200),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable statement logging.
    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    /// Only log statements slower than this duration.
    pub fn log_min_duration(mut self, duration: Duration) -> Self {
        self.log_min_duration = Some(duration);
        self
    }

    /// Set slow query threshold.
    pub fn slow_threshold(mut self, duration: Duration) -> Self {
        self.slow_query_threshold = Some(duration);
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }
}
