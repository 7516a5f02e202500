use crate::value::Value;
use std::fmt;
use std::time::Duration;

/// Statement kind, from the leading keyword of its SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// DDL, `WITH`, and anything else.
    Other,
}

impl QueryType {
    pub fn from_sql(sql: &str) -> Self {
        const KEYWORDS: [(&str, QueryType); 4] = [
            ("SELECT", QueryType::Select),
            ("INSERT", QueryType::Insert),
            ("UPDATE", QueryType::Update),
            ("DELETE", QueryType::Delete),
        ];

        let head = leading_keyword(sql);
        KEYWORDS
            .iter()
            .find(|(keyword, _)| head.eq_ignore_ascii_case(keyword))
            .map_or(QueryType::Other, |&(_, kind)| kind)
    }
}

/// First alphabetic word of `sql`, after whitespace, comments and opening parens.
fn leading_keyword(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(comment) = rest.strip_prefix("--") {
            let Some(eol) = comment.find('\n') else {
                return "";
            };
            rest = &comment[eol + 1..];
        } else if let Some(comment) = rest.strip_prefix("/*") {
            let Some(close) = comment.find("*/") else {
                return "";
            };
            rest = &comment[close + 2..];
        } else {
            break;
        }
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    &rest[..end]
}

/// What a monitor sees of one statement.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// The SQL statement, with `?` placeholders.
    pub sql: String,
    /// Bound parameters, in placeholder order.
    pub params: Vec<Value>,
    /// Detected query type.
    pub query_type: QueryType,
    /// Optional tag, usually the model name that issued the statement.
    pub tag: Option<String>,
}

impl QueryContext {
    pub fn new(sql: &str, params: &[Value]) -> Self {
        Self {
            sql: sql.to_string(),
            params: params.to_vec(),
            query_type: QueryType::from_sql(sql),
            tag: None,
        }
    }

    /// Attribute the statement, usually to a model name.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

const MAX_ERROR_LEN: usize = 512;

/// Outcome of one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Number of rows fetched.
    Rows(usize),
    /// Number of rows changed.
    Affected(u64),
    /// Driver error message, at most 512 bytes plus an ellipsis.
    Error(String),
}

impl QueryResult {
    pub fn error(msg: String) -> Self {
        if msg.len() <= MAX_ERROR_LEN {
            return Self::Error(msg);
        }
        Self::Error(format!("{}...", super::truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Observer of every statement a [`Session`](crate::Session) runs.
///
/// Sessions call `on_query_start` before execution and `on_query_complete` after it,
/// failures included. `on_slow_query` fires additionally when the session's slow
/// threshold is exceeded.
pub trait QueryMonitor: Send + Sync {
    fn on_query_start(&self, _ctx: &QueryContext) {}

    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult);

    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {}
}
