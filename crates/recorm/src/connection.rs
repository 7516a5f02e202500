//! Driver-facing connection traits.
//!
//! A [`Connection`] is the only thing a [`Session`](crate::Session) needs from a
//! database driver: prepare a statement with positional `?` placeholders, execute it
//! with an ordered parameter list, walk its result rows, and report the id generated
//! by the last insert.

use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;

/// A database handle capable of preparing parameterized statements.
pub trait Connection: Send + Sync {
    /// Driver-name token used to pick the identifier quote style (e.g. `pgsql`, `mysql`).
    fn driver_name(&self) -> &str;

    /// Prepare a statement. `sql` uses `?` placeholders.
    fn prepare<'a>(&'a self, sql: &str) -> OrmResult<Box<dyn Statement + 'a>>;

    /// The id generated by the most recent successful insert on this connection.
    ///
    /// Returns `None` when the driver has no generated id to report.
    fn last_insert_id(&self) -> OrmResult<Option<Value>>;

    /// The statement `last_insert_id` amounts to, as shown to monitors.
    fn last_insert_id_sql(&self) -> &str {
        "SELECT LAST_INSERT_ID()"
    }
}

/// A prepared statement and, once executed, its row cursor.
pub trait Statement {
    /// Execute with the given positional parameters.
    ///
    /// Returns the number of affected rows for mutations, or the number of result
    /// rows for queries when the driver knows it.
    fn execute(&mut self, params: &[Value]) -> OrmResult<u64>;

    /// Fetch the next result row, or `None` when the cursor is exhausted.
    fn fetch_row(&mut self) -> OrmResult<Option<Row>>;
}
