use super::truncate_sql_bytes;
use super::types::{QueryContext, QueryMonitor, QueryResult, QueryType};
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Ignores every statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopMonitor;

impl QueryMonitor for NoopMonitor {
    fn on_query_complete(&self, _: &QueryContext, _: Duration, _: &QueryResult) {}
}

/// A monitor that emits one `tracing` event per statement.
///
/// Successful statements are logged at DEBUG, failures at WARN, slow statements at
/// WARN, all under the `recorm.sql` target.
#[derive(Debug, Clone)]
pub struct LoggingMonitor {
    /// Successful statements faster than this are not logged. Failures always are.
    pub min_duration: Option<Duration>,
    /// Logged SQL is cut to this many bytes; `None` logs it whole.
    pub max_sql_length: Option<usize>,
}

impl Default for LoggingMonitor {
    fn default() -> Self {
        Self {
            min_duration: None,
            max_sql_length: Some(200),
        }
    }
}

impl LoggingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_duration(mut self, duration: Duration) -> Self {
        self.min_duration = Some(duration);
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Log SQL untruncated.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        let Some(max) = self.max_sql_length.filter(|&max| sql.len() > max) else {
            return sql.to_string();
        };
        format!("{}...", truncate_sql_bytes(sql, max))
    }
}

impl QueryMonitor for LoggingMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let sql = self.truncate_sql(&ctx.sql);
        let model = ctx.tag.as_deref().unwrap_or("-");

        // Failures are always logged, regardless of duration.
        if let QueryResult::Error(message) = result {
            tracing::warn!(
                target: "recorm.sql",
                kind = ?ctx.query_type,
                model,
                param_count = ctx.param_count(),
                params = ?ctx.params,
                ?duration,
                error = %message,
                sql = %sql,
                "statement failed"
            );
            return;
        }

        if self.min_duration.is_some_and(|min| duration < min) {
            return;
        }

        tracing::debug!(
            target: "recorm.sql",
            kind = ?ctx.query_type,
            model,
            param_count = ctx.param_count(),
            ?duration,
            result = %result,
            sql = %sql,
        );
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        tracing::warn!(
            target: "recorm.sql",
            kind = ?ctx.query_type,
            ?duration,
            sql = %self.truncate_sql(&ctx.sql),
            "slow query"
        );
    }
}

/// One entry of a [`StatementLog`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub sql: String,
    pub params: Vec<Value>,
    pub query_type: QueryType,
    pub tag: Option<String>,
    pub result: QueryResult,
}

impl LogEntry {
    pub fn is_error(&self) -> bool {
        self.result.is_error()
    }
}

/// An in-memory diagnostic trail of every statement a session executed,
/// including failures with their SQL and parameters.
///
/// Unbounded by default; long-lived sessions should use
/// [`StatementLog::with_capacity`], which keeps only the newest entries, or call
/// [`StatementLog::clear`]. Cloning shares the underlying log.
#[derive(Debug, Clone, Default)]
pub struct StatementLog {
    inner: Arc<Mutex<LogBuffer>>,
}

#[derive(Debug, Default)]
struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: Option<usize>,
}

impl StatementLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` entries, dropping the oldest first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogBuffer {
                entries: VecDeque::with_capacity(capacity),
                capacity: Some(capacity),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LogBuffer> {
        // A panic while holding the lock leaves the buffer intact.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    /// Only the failed statements.
    pub fn errors(&self) -> Vec<LogEntry> {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.is_error())
            .cloned()
            .collect()
    }

    /// The SQL of every executed statement, oldest first.
    pub fn statements(&self) -> Vec<String> {
        self.lock().entries.iter().map(|e| e.sql.clone()).collect()
    }

    pub fn last(&self) -> Option<LogEntry> {
        self.lock().entries.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

impl QueryMonitor for StatementLog {
    fn on_query_complete(&self, ctx: &QueryContext, _duration: Duration, result: &QueryResult) {
        let mut buffer = self.lock();
        if buffer.capacity == Some(0) {
            return;
        }
        if buffer.capacity.is_some_and(|cap| buffer.entries.len() >= cap) {
            buffer.entries.pop_front();
        }
        buffer.entries.push_back(LogEntry {
            sql: ctx.sql.clone(),
            params: ctx.params.clone(),
            query_type: ctx.query_type,
            tag: ctx.tag.clone(),
            result: result.clone(),
        });
    }
}

/// Counts statements per query type, failures, and time spent.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    total: AtomicU64,
    failed: AtomicU64,
    /// SELECT, INSERT, UPDATE, DELETE.
    by_type: [AtomicU64; 4],
    nanos: AtomicU64,
    max_nanos: AtomicU64,
}

/// Snapshot of a [`StatsMonitor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    pub total_queries: u64,
    pub failed_queries: u64,
    pub total_duration: Duration,
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    /// Slowest single statement.
    pub max_duration: Duration,
}

impl StatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(query_type: QueryType) -> Option<usize> {
        match query_type {
            QueryType::Select => Some(0),
            QueryType::Insert => Some(1),
            QueryType::Update => Some(2),
            QueryType::Delete => Some(3),
            QueryType::Other => None,
        }
    }

    pub fn stats(&self) -> QueryStats {
        let read = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        QueryStats {
            total_queries: read(&self.total),
            failed_queries: read(&self.failed),
            total_duration: Duration::from_nanos(read(&self.nanos)),
            select_count: read(&self.by_type[0]),
            insert_count: read(&self.by_type[1]),
            update_count: read(&self.by_type[2]),
            delete_count: read(&self.by_type[3]),
            max_duration: Duration::from_nanos(read(&self.max_nanos)),
        }
    }

    pub fn reset(&self) {
        let counters = [&self.total, &self.failed, &self.nanos, &self.max_nanos];
        for counter in counters.into_iter().chain(self.by_type.iter()) {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl QueryMonitor for StatsMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if result.is_error() {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(slot) = Self::slot(ctx.query_type) {
            self.by_type[slot].fetch_add(1, Ordering::Relaxed);
        }

        let nanos = duration.as_nanos().min(u128::from(u64::MAX)) as u64;
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
    }
}

/// Forwards every callback to a list of monitors, in insertion order.
#[derive(Clone, Default)]
pub struct CompositeMonitor {
    members: Vec<Arc<dyn QueryMonitor>>,
}

impl CompositeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<M: QueryMonitor + 'static>(self, monitor: M) -> Self {
        self.add_arc(Arc::new(monitor))
    }

    /// Add a monitor the caller keeps a handle to.
    pub fn add_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.members.push(monitor);
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl std::fmt::Debug for CompositeMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeMonitor")
            .field("members", &self.members.len())
            .finish()
    }
}

impl QueryMonitor for CompositeMonitor {
    fn on_query_start(&self, ctx: &QueryContext) {
        self.members.iter().for_each(|m| m.on_query_start(ctx));
    }

    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        self.members
            .iter()
            .for_each(|m| m.on_query_complete(ctx, duration, result));
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        self.members
            .iter()
            .for_each(|m| m.on_slow_query(ctx, duration));
    }
}
