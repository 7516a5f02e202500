//! The explicit session every record is bound to.

use crate::builder::BuiltQuery;
use crate::config::SessionConfig;
use crate::connection::Connection;
use crate::error::{OrmError, OrmResult};
use crate::monitor::{
    CompositeMonitor, LoggingMonitor, QueryContext, QueryMonitor, QueryResult,
};
use crate::quote::QuoteStyle;
use crate::row::Row;
use crate::value::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// A database session: one connection handle, its identifier quote style, and the
/// monitors that observe every statement.
///
/// Cloning is cheap and shares the connection, cached quote style and monitors.
///
/// ```ignore
/// let session = Session::connect(&ConnectionConfig::from_env()?)?
///     .with_monitor(StatementLog::new());
/// let mut users = Record::<User>::new(&session);
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Clone)]
struct SessionInner {
    conn: Option<Arc<dyn Connection>>,
    driver: String,
    quote: OnceLock<QuoteStyle>,
    monitors: CompositeMonitor,
    logger: Option<LoggingMonitor>,
    config: SessionConfig,
}

impl Session {
    /// Create a session over an open connection.
    pub fn new(conn: impl Connection + 'static) -> Self {
        Self::from_arc(Arc::new(conn))
    }

    /// Create a session over a shared connection.
    pub fn from_arc(conn: Arc<dyn Connection>) -> Self {
        let driver = conn.driver_name().to_string();
        Self::build(Some(conn), driver)
    }

    /// Create a session with no connection handle.
    ///
    /// SQL can still be assembled for inspection; every statement fails with
    /// [`OrmError::NoConnection`].
    pub fn offline(driver: impl Into<String>) -> Self {
        Self::build(None, driver.into())
    }

    /// Open a connection for `config` and wrap it in a session.
    ///
    /// Only the `pgsql` driver is built in; other drivers are plugged in through
    /// [`Session::new`] with a custom [`Connection`].
    #[cfg(feature = "postgres")]
    pub fn connect(config: &crate::config::ConnectionConfig) -> OrmResult<Self> {
        config.validate()?;
        if config.url.is_none() && config.driver != "pgsql" {
            return Err(OrmError::Connection(format!(
                "no built-in driver for '{}'",
                config.driver
            )));
        }
        match &config.url {
            // The URL may carry a password; it is not logged.
            Some(_) => tracing::info!(target: "recorm.session", "connecting with configured url"),
            None => tracing::info!(target: "recorm.session", dsn = %config.dsn(), "connecting"),
        }
        let conn = crate::pg::PgConnection::connect(config)?;
        Ok(Self::new(conn))
    }

    fn build(conn: Option<Arc<dyn Connection>>, driver: String) -> Self {
        let config = SessionConfig::default();
        Self {
            inner: Arc::new(SessionInner {
                conn,
                driver,
                quote: OnceLock::new(),
                monitors: CompositeMonitor::new(),
                logger: logger_for(&config),
                config,
            }),
        }
    }

    fn inner_mut(&mut self) -> &mut SessionInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Add a monitor; every statement is reported to all monitors in order.
    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        let inner = self.inner_mut();
        inner.monitors = std::mem::take(&mut inner.monitors).add(monitor);
        self
    }

    /// Add a shared monitor.
    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        let inner = self.inner_mut();
        inner.monitors = std::mem::take(&mut inner.monitors).add_arc(monitor);
        self
    }

    /// Replace the session configuration.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        let inner = self.inner_mut();
        inner.logger = logger_for(&config);
        inner.config = config;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn driver_name(&self) -> &str {
        &self.inner.driver
    }

    pub fn has_connection(&self) -> bool {
        self.inner.conn.is_some()
    }

    /// Identifier quote style for this session's driver.
    ///
    /// Resolved on first use and cached for the life of the session.
    pub fn quote_style(&self) -> QuoteStyle {
        *self.inner.quote.get_or_init(|| {
            let style = QuoteStyle::for_driver(&self.inner.driver);
            tracing::debug!(
                target: "recorm.session",
                driver = %self.inner.driver,
                quote = %style.as_char(),
                "resolved identifier quote style"
            );
            style
        })
    }

    fn connection(&self) -> OrmResult<&dyn Connection> {
        self.inner.conn.as_deref().ok_or(OrmError::NoConnection)
    }

    /// Run a statement and collect its result rows.
    pub fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.run(sql, params, None, true).map(|(_, rows)| rows)
    }

    /// Run a statement and return the number of affected rows.
    pub fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.run(sql, params, None, false).map(|(affected, _)| affected)
    }

    pub(crate) fn query_built(&self, query: &BuiltQuery, tag: &str) -> OrmResult<Vec<Row>> {
        self.run(&query.sql, &query.params, Some(tag), true)
            .map(|(_, rows)| rows)
    }

    pub(crate) fn execute_built(&self, query: &BuiltQuery, tag: &str) -> OrmResult<u64> {
        self.run(&query.sql, &query.params, Some(tag), false)
            .map(|(affected, _)| affected)
    }

    /// The id generated by the most recent insert on this session's connection.
    ///
    /// The lookup is reported to the monitors like any other statement.
    pub fn last_insert_id(&self) -> OrmResult<Option<Value>> {
        self.generated_id(None)
    }

    pub(crate) fn generated_id(&self, tag: Option<&str>) -> OrmResult<Option<Value>> {
        let conn = self.connection()?;
        self.instrumented(
            conn.last_insert_id_sql(),
            &[],
            tag,
            |conn| conn.last_insert_id(),
            |id| QueryResult::Rows(usize::from(id.is_some())),
        )
    }

    fn run(
        &self,
        sql: &str,
        params: &[Value],
        tag: Option<&str>,
        fetch: bool,
    ) -> OrmResult<(u64, Vec<Row>)> {
        self.instrumented(
            sql,
            params,
            tag,
            |conn| exec_on(conn, sql, params, fetch),
            |(affected, rows)| {
                if fetch {
                    QueryResult::Rows(rows.len())
                } else {
                    QueryResult::Affected(*affected)
                }
            },
        )
    }

    /// Time `exec` against the connection and report it as `sql`.
    fn instrumented<T>(
        &self,
        sql: &str,
        params: &[Value],
        tag: Option<&str>,
        exec: impl FnOnce(&dyn Connection) -> OrmResult<T>,
        summarize: impl FnOnce(&T) -> QueryResult,
    ) -> OrmResult<T> {
        let conn = self.connection()?;

        let mut ctx = QueryContext::new(sql, params);
        if let Some(tag) = tag {
            ctx.tag = Some(tag.to_string());
        }
        self.inner.monitors.on_query_start(&ctx);

        let start = Instant::now();
        let result = exec(conn);
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(value) => summarize(value),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.report_result(&ctx, duration, &query_result);
        result
    }

    fn report_result(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let inner = &self.inner;
        if let Some(logger) = &inner.logger {
            logger.on_query_complete(ctx, duration, result);
        }
        inner.monitors.on_query_complete(ctx, duration, result);

        if let Some(threshold) = inner.config.slow_query_threshold {
            if duration > threshold {
                if let Some(logger) = &inner.logger {
                    logger.on_slow_query(ctx, duration);
                }
                inner.monitors.on_slow_query(ctx, duration);
            }
        }
    }
}

fn exec_on(
    conn: &dyn Connection,
    sql: &str,
    params: &[Value],
    fetch: bool,
) -> OrmResult<(u64, Vec<Row>)> {
    let mut stmt = conn.prepare(sql)?;
    let affected = stmt.execute(params)?;
    let mut rows = Vec::new();
    if fetch {
        while let Some(row) = stmt.fetch_row()? {
            rows.push(row);
        }
    }
    Ok((affected, rows))
}

fn logger_for(config: &SessionConfig) -> Option<LoggingMonitor> {
    if !config.logging_enabled {
        return None;
    }
    let mut logger = LoggingMonitor::new();
    logger.min_duration = config.log_min_duration;
    logger.max_sql_length = config.max_sql_length;
    Some(logger)
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("driver", &self.inner.driver)
            .field("connected", &self.inner.conn.is_some())
            .field("monitors", &self.inner.monitors.len())
            .field("config", &self.inner.config)
            .finish()
    }
}
