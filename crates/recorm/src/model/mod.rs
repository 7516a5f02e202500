//! Active records.
//!
//! A [`Record<M>`] pairs the builder configuration of one query lifecycle (shared,
//! copy-on-write) with the field data of one row and its dirty set. Fluent calls
//! configure the query; terminal calls (`find_one`, `find_many`, `save`, `delete`,
//! `raw_query`) execute it through the record's [`Session`].
//!
//! # Example
//!
//! ```ignore
//! use recorm::{model, Record, Session};
//!
//! model!(pub struct BlogPost);
//!
//! let mut post = Record::<BlogPost>::new(&session);
//! post.create().set("title", "Hello").set("body", "...");
//! post.save()?;                     // INSERT INTO `blog_post` (`title`, `body`) VALUES (?, ?)
//!
//! let recent = Record::<BlogPost>::new(&session)
//!     .order(["created_at"], "DESC")
//!     .limit(10)
//!     .find_many()?;
//! ```

mod persist;
mod query;

#[cfg(test)]
mod tests;

use crate::builder::QueryState;
use crate::error::OrmResult;
use crate::ident;
use crate::row::{FromRow, Row};
use crate::session::Session;
use crate::value::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A table-mapped type.
///
/// The table name is derived from [`Model::NAME`] (`BlogPost` → `blog_post`). The id
/// column defaults to `id_<table>` unless [`Model::id_column`] overrides it.
pub trait Model {
    /// Upper-camel-case type identifier.
    const NAME: &'static str;

    /// The id column, if it is not `id_<table>`.
    fn id_column() -> Option<&'static str> {
        None
    }
}

/// Declare a unit struct implementing [`Model`].
///
/// ```ignore
/// recorm::model!(pub struct User);
/// recorm::model!(pub struct BlogPost, id = "post_id");
/// ```
#[macro_export]
macro_rules! model {
    ($(#[$meta:meta])* $vis:vis struct $name:ident $(, id = $id:literal)? $(;)?) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        $vis struct $name;

        impl $crate::Model for $name {
            const NAME: &'static str = stringify!($name);
            $(
                fn id_column() -> Option<&'static str> {
                    Some($id)
                }
            )?
        }
    };
}

/// One model instance: query configuration plus row data.
pub struct Record<M: Model> {
    session: Session,
    state: Arc<QueryState>,
    id_column: String,
    fields: Row,
    dirty: Row,
    is_new: bool,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Record<M> {
    /// Create an empty record bound to `session`.
    pub fn new(session: &Session) -> Self {
        let style = session.quote_style();
        let table = ident::table_name(M::NAME, style);
        let id_column = match M::id_column() {
            Some(column) => column.to_string(),
            None => format!("id_{}", ident::unquote_ident(&table, style)),
        };
        Self {
            session: session.clone(),
            state: Arc::new(QueryState::new(table, style)),
            id_column,
            fields: Row::new(),
            dirty: Row::new(),
            is_new: false,
            _model: PhantomData,
        }
    }

    /// A record for one result row, sharing this record's query configuration.
    fn with_row(&self, row: Row) -> Self {
        Self {
            session: self.session.clone(),
            state: Arc::clone(&self.state),
            id_column: self.id_column.clone(),
            fields: row,
            dirty: Row::new(),
            is_new: false,
            _model: PhantomData,
        }
    }

    fn hydrate(&mut self, row: Row) {
        self.fields = row;
        self.dirty.clear();
        self.is_new = false;
    }

    pub(crate) fn state_mut(&mut self) -> &mut QueryState {
        Arc::make_mut(&mut self.state)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The accumulated query configuration.
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Quoted table name.
    pub fn table_name(&self) -> &str {
        self.state.table()
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Override the id column for this record.
    pub fn set_id_column(&mut self, column: impl Into<String>) -> &mut Self {
        self.id_column = column.into();
        self
    }

    /// Current value of `column`, or `None` when it is not loaded.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Assign `column` and mark it dirty.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        self.fields.insert(column, value.clone());
        self.dirty.insert(column, value);
        self
    }

    /// Value of the id column.
    pub fn id(&self) -> Option<&Value> {
        self.fields.get(&self.id_column)
    }

    fn id_value(&self) -> Value {
        self.id().cloned().unwrap_or(Value::Null)
    }

    pub fn fields(&self) -> &Row {
        &self.fields
    }

    /// Fields assigned since the last successful persist, in assignment order.
    pub fn dirty_fields(&self) -> &Row {
        &self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Decode the loaded fields into `T`.
    pub fn decode<T: FromRow>(&self) -> OrmResult<T> {
        T::from_row(&self.fields)
    }
}

impl<M: Model> Clone for Record<M> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            state: Arc::clone(&self.state),
            id_column: self.id_column.clone(),
            fields: self.fields.clone(),
            dirty: self.dirty.clone(),
            is_new: self.is_new,
            _model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for Record<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &M::NAME)
            .field("table", &self.state.table())
            .field("id_column", &self.id_column)
            .field("fields", &self.fields)
            .field("dirty", &self.dirty)
            .field("is_new", &self.is_new)
            .finish()
    }
}
