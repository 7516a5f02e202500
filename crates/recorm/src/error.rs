use thiserror::Error;

pub type OrmResult<T> = Result<T, OrmError>;

/// Everything that can go wrong between a record and the database.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Could not open the connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The session has no connection handle
    #[error("No connection available")]
    NoConnection,

    /// The driver rejected the statement.
    #[error("Query error: {message} (sql: {sql})")]
    Query { sql: String, message: String },

    #[cfg(feature = "postgres")]
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// A column could not be converted to the requested type.
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// The accumulated query state cannot be rendered.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl OrmError {
    pub fn query(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            sql: sql.into(),
            message: message.into(),
        }
    }

    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// True for errors raised by the database while running a statement.
    pub fn is_query_error(&self) -> bool {
        match self {
            Self::Query { .. }
            | Self::UniqueViolation(_)
            | Self::ForeignKeyViolation(_)
            | Self::CheckViolation(_) => true,
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => true,
            _ => false,
        }
    }

    /// Map integrity-constraint SQLSTATEs (class 23) to their variants.
    #[cfg(feature = "postgres")]
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let Some(db) = err.as_db_error() else {
            return Self::Postgres(err);
        };
        let detail = format!("{}: {}", db.constraint().unwrap_or("unknown"), db.message());
        match db.code().code() {
            "23505" => Self::UniqueViolation(detail),
            "23503" => Self::ForeignKeyViolation(detail),
            "23514" => Self::CheckViolation(detail),
            _ => Self::Postgres(err),
        }
    }
}
