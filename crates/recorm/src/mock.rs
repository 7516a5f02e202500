//! A scripted in-memory [`Connection`] for tests.
//!
//! Responses are served from a queue (or a responder closure); every executed
//! statement is recorded with its parameters.
//!
//! ```ignore
//! let conn = MockConnection::new("mysql");
//! conn.push_rows(vec![row! { "id_user" => 1, "name" => "Ann" }]);
//! let session = Session::new(conn.clone());
//! ```

use crate::connection::{Connection, Statement};
use crate::error::{OrmError, OrmResult};
use crate::monitor::QueryType;
use crate::row::Row;
use crate::value::Value;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// What the next statement produces.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    /// Result rows for a query.
    Rows(Vec<Row>),
    /// Affected row count for a mutation.
    Affected(u64),
    /// The statement fails with this driver message.
    Error(String),
}

type Responder = dyn Fn(&str, &[Value]) -> Option<MockResponse> + Send + Sync;

#[derive(Default)]
struct MockState {
    queue: VecDeque<MockResponse>,
    executed: Vec<(String, Vec<Value>)>,
    last_insert_id: Option<i64>,
    last_insert_id_error: Option<String>,
    next_id: i64,
}

/// Scripted driver. Clones share the same queue and statement log.
///
/// With nothing queued, queries return no rows and mutations affect one row. Each
/// successful `INSERT` advances the generated id reported by `last_insert_id`.
#[derive(Clone)]
pub struct MockConnection {
    driver: String,
    state: Arc<Mutex<MockState>>,
    responder: Option<Arc<Responder>>,
}

impl MockConnection {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            state: Arc::new(Mutex::new(MockState {
                next_id: 1,
                ..MockState::default()
            })),
            responder: None,
        }
    }

    /// Answer statements with `responder` before falling back to the queue.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Option<MockResponse> + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Start generated ids at `id`.
    pub fn with_next_id(self, id: i64) -> Self {
        self.lock().next_id = id;
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_response(&self, response: MockResponse) -> &Self {
        self.lock().queue.push_back(response);
        self
    }

    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.push_response(MockResponse::Rows(rows))
    }

    pub fn push_affected(&self, affected: u64) -> &Self {
        self.push_response(MockResponse::Affected(affected))
    }

    pub fn push_error(&self, message: impl Into<String>) -> &Self {
        self.push_response(MockResponse::Error(message.into()))
    }

    /// Make the next `last_insert_id` call fail with `message`.
    pub fn fail_last_insert_id(&self, message: impl Into<String>) -> &Self {
        self.lock().last_insert_id_error = Some(message.into());
        self
    }

    /// Every executed statement with its parameters, oldest first.
    pub fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.lock().executed.clone()
    }

    pub fn execution_count(&self) -> usize {
        self.lock().executed.len()
    }

    pub fn clear_executed(&self) {
        self.lock().executed.clear();
    }

    fn respond(&self, sql: &str, params: &[Value]) -> MockResponse {
        if let Some(response) = self.responder.as_ref().and_then(|r| r(sql, params)) {
            return response;
        }
        let queued = self.lock().queue.pop_front();
        queued.unwrap_or_else(|| match QueryType::from_sql(sql) {
            QueryType::Select => MockResponse::Rows(Vec::new()),
            _ => MockResponse::Affected(1),
        })
    }
}

impl fmt::Debug for MockConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MockConnection")
            .field("driver", &self.driver)
            .field("queued", &state.queue.len())
            .field("executed", &state.executed.len())
            .field("responder", &self.responder.is_some())
            .finish()
    }
}

impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    fn prepare<'a>(&'a self, sql: &str) -> OrmResult<Box<dyn Statement + 'a>> {
        Ok(Box::new(MockStatement {
            conn: self,
            sql: sql.to_string(),
            rows: VecDeque::new(),
        }))
    }

    fn last_insert_id(&self) -> OrmResult<Option<Value>> {
        let mut state = self.lock();
        match state.last_insert_id_error.take() {
            Some(message) => Err(OrmError::query(self.last_insert_id_sql(), message)),
            None => Ok(state.last_insert_id.map(Value::Int)),
        }
    }
}

struct MockStatement<'a> {
    conn: &'a MockConnection,
    sql: String,
    rows: VecDeque<Row>,
}

impl Statement for MockStatement<'_> {
    fn execute(&mut self, params: &[Value]) -> OrmResult<u64> {
        self.conn
            .lock()
            .executed
            .push((self.sql.clone(), params.to_vec()));

        match self.conn.respond(&self.sql, params) {
            MockResponse::Rows(rows) => {
                let count = rows.len() as u64;
                self.rows = rows.into();
                Ok(count)
            }
            MockResponse::Affected(affected) => {
                if affected > 0 && QueryType::from_sql(&self.sql) == QueryType::Insert {
                    let mut state = self.conn.lock();
                    state.last_insert_id = Some(state.next_id);
                    state.next_id += 1;
                }
                Ok(affected)
            }
            MockResponse::Error(message) => Err(OrmError::query(&self.sql, message)),
        }
    }

    fn fetch_row(&mut self) -> OrmResult<Option<Row>> {
        Ok(self.rows.pop_front())
    }
}
