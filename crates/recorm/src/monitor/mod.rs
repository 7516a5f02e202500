//! Statement monitoring and diagnostics.
//!
//! Every statement a [`Session`](crate::Session) executes is reported to its monitors:
//! - [`LoggingMonitor`]: structured `tracing` events (target `recorm.sql`)
//! - [`StatementLog`]: an in-memory, inspectable trail of statements, parameters and failures
//! - [`StatsMonitor`]: counters per query type
//!
//! # Example
//!
//! ```rust,ignore
//! use recorm::{CompositeMonitor, LoggingMonitor, Session, StatementLog};
//!
//! let log = StatementLog::new();
//! let session = Session::new(conn).with_monitor(
//!     CompositeMonitor::new()
//!         .add(LoggingMonitor::new().max_sql_length(500))
//!         .add(log.clone()),
//! );
//! // ... run queries ...
//! for failure in log.errors() {
//!     eprintln!("{} -- {}", failure.sql, failure.result);
//! }
//! ```

mod monitors;
mod types;


pub use monitors::{
    CompositeMonitor, LogEntry, LoggingMonitor, NoopMonitor, QueryStats, StatementLog,
    StatsMonitor,
};
pub use types::{QueryContext, QueryMonitor, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
