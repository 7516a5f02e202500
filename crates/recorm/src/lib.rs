//! # recorm
//!
//! A lightweight active-record data mapper.
//!
//! ## Features
//!
//! - **One model, one table**: the table name is derived from the model's type name
//!   (`BlogPost` → `blog_post`), the id column defaults to `id_<table>`
//! - **Fluent query builder**: columns, joins, predicates, grouping, ordering and paging
//!   accumulate on a record and are assembled into one SQL statement at execution
//! - **Dirty tracking**: `save()` inserts new records, updates only changed fields, and
//!   skips the round trip when nothing changed
//! - **Explicit sessions**: every record is bound to a [`Session`] carrying the
//!   connection, the identifier quote style, and the statement monitors
//! - **Pluggable drivers**: anything implementing [`Connection`]; a blocking Postgres
//!   driver ships behind the `postgres` feature
//!
//! ## Example
//!
//! ```ignore
//! use recorm::{model, ConnectionConfig, JoinOn, Record, Session, StatementLog};
//!
//! model!(pub struct User);
//! model!(pub struct Post);
//!
//! let log = StatementLog::new();
//! let session = Session::connect(&ConnectionConfig::from_env()?)?.with_monitor(log.clone());
//!
//! // INSERT INTO "user" ("name", "email") VALUES ($1, $2)
//! let mut user = Record::<User>::new(&session);
//! user.create().set("name", "alice").set("email", "alice@example.com");
//! user.save()?;
//!
//! // SELECT "user"."name" FROM "user"
//! //   INNER JOIN "post" ON "user"."id_user" = "post"."author"
//! //   WHERE "post"."published" = $1 ORDER BY "user"."name" ASC LIMIT 10
//! let authors = Record::<User>::new(&session)
//!     .select(["user.name"])
//!     .join::<Post>("inner", JoinOn::on("id_user", "=", "author"))
//!     .where_eq("post.published", true)
//!     .order(["user.name"], "ASC")
//!     .limit(10)
//!     .find_many()?;
//! ```

pub mod builder;
pub mod config;
pub mod connection;
pub mod error;
pub mod ident;
pub mod model;
pub mod monitor;
pub mod quote;
pub mod row;
pub mod session;
pub mod value;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "postgres")]
pub mod pg;

pub use builder::{BuiltQuery, Direction, JoinCondition, JoinOn, QueryState};
pub use config::{ConnectionConfig, SessionConfig};
pub use connection::{Connection, Statement};
pub use error::{OrmError, OrmResult};
pub use model::{Model, Record};
pub use monitor::{
    CompositeMonitor, LogEntry, LoggingMonitor, NoopMonitor, QueryContext, QueryMonitor,
    QueryResult, QueryStats, QueryType, StatementLog, StatsMonitor,
};
pub use quote::QuoteStyle;
pub use row::{FromRow, Row};
pub use session::Session;
pub use value::{Bind, FromValue, Value};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockConnection, MockResponse};

#[cfg(feature = "postgres")]
pub use pg::PgConnection;

#[cfg(feature = "postgres")]
pub use tokio_postgres;
