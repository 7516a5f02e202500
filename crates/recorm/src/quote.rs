//! Identifier quote style per driver.

/// The character used to quote SQL identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteStyle {
    /// `"ident"` (ANSI; Postgres, SQL Server, Sybase)
    Double,
    /// `` `ident` `` (MySQL, SQLite)
    Backtick,
}

impl QuoteStyle {
    /// Resolve the quote style for a driver-name token.
    ///
    /// Unrecognized drivers fall back to [`QuoteStyle::Backtick`].
    pub fn for_driver(driver: &str) -> Self {
        match driver {
            "pgsql" | "sqlsrv" | "dblib" | "mssql" | "sybase" => Self::Double,
            _ => Self::Backtick,
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::Double => '"',
            Self::Backtick => '`',
        }
    }
}

impl Default for QuoteStyle {
    fn default() -> Self {
        Self::Backtick
    }
}
