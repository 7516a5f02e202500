//! Query state and SQL assembly.
//!
//! A [`QueryState`] accumulates the fragments of one query lifecycle (result columns,
//! joins, predicates, grouping, ordering, paging, raw override) and assembles them
//! into a [`BuiltQuery`] just before execution.
//!
//! ## Design
//!
//! - Identifiers are quoted when they are recorded, with the quote style the state
//!   was created with.
//! - Every clause is rendered only when its state is set; clauses are joined by a
//!   single space in fixed order.
//! - Placeholders are positional `?`; the parameter list is the concatenation of
//!   every predicate's values, in call order.
//! - Invalid builder input (a join condition with no joined table left to qualify it)
//!   is stored and reported as [`OrmError::Validation`] by [`QueryState::validate`].

mod delete;
mod insert;
mod join;
mod select;
mod update;
mod where_builder;


pub use join::{JoinCondition, JoinOn};
pub use select::Direction;

use crate::error::{OrmError, OrmResult};
use crate::quote::QuoteStyle;
use crate::value::{Bind, Value};

/// Accumulated builder configuration for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    /// Quoted table name.
    table: String,
    style: QuoteStyle,
    /// Quoted result columns (default `*`).
    columns: Vec<String>,
    distinct: bool,
    /// Rendered JOIN clauses.
    joins: Vec<String>,
    /// Quoted names of joined tables not yet consumed by a join condition.
    join_tables: Vec<String>,
    /// Predicate fragments with their bound values.
    wheres: Vec<(String, Bind)>,
    group: Vec<String>,
    order: Vec<String>,
    direction: Option<Direction>,
    limit: Option<u64>,
    limit_offset: Option<u64>,
    offset: Option<u64>,
    raw: Option<(String, Vec<Value>)>,
    build_error: Option<String>,
}

impl QueryState {
    /// Create an empty state for an already quoted table name.
    pub fn new(table: impl Into<String>, style: QuoteStyle) -> Self {
        Self {
            table: table.into(),
            style,
            columns: vec!["*".to_string()],
            distinct: false,
            joins: Vec::new(),
            join_tables: Vec::new(),
            wheres: Vec::new(),
            group: Vec::new(),
            order: Vec::new(),
            direction: None,
            limit: None,
            limit_offset: None,
            offset: None,
            raw: None,
            build_error: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn quote_style(&self) -> QuoteStyle {
        self.style
    }

    pub(crate) fn quote(&self, fragment: &str) -> String {
        crate::ident::quote_ident(fragment, self.style)
    }

    /// Install a literal statement that bypasses assembly.
    pub fn raw(&mut self, sql: impl Into<String>, params: Vec<Value>) -> &mut Self {
        self.raw = Some((sql.into(), params));
        self
    }

    pub fn has_raw(&self) -> bool {
        self.raw.is_some()
    }

    /// Report a stored builder error, if any.
    pub fn validate(&self) -> OrmResult<()> {
        if let Some(err) = &self.build_error {
            return Err(OrmError::Validation(err.clone()));
        }
        Ok(())
    }

    /// The statement a read executes: the raw override when installed, otherwise the
    /// assembled SELECT.
    pub fn build_read(&self) -> OrmResult<BuiltQuery> {
        match &self.raw {
            Some((sql, params)) => Ok(BuiltQuery::new(sql.clone(), params.clone())),
            None => self.build_select(),
        }
    }
}

/// Assembled SQL plus its ordered parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub(crate) sql: String,
    pub(crate) params: Vec<Value>,
}

impl BuiltQuery {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Byte offsets of the positional `?` placeholders in `sql`.
///
/// A `?` inside a quoted literal or identifier (`'..'`, `".."` or `` `..` ``) is text,
/// not a placeholder.
pub(crate) fn placeholder_offsets(sql: &str) -> Vec<usize> {
    let mut quote: Option<char> = None;
    sql.char_indices()
        .filter_map(|(idx, ch)| match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
                None
            }
            None => match ch {
                '\'' | '"' | '`' => {
                    quote = Some(ch);
                    None
                }
                '?' => Some(idx),
                _ => None,
            },
        })
        .collect()
}

/// Join the non-empty clauses with single spaces.
fn join_if_not_empty<'a>(clauses: impl IntoIterator<Item = &'a str>) -> String {
    clauses
        .into_iter()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
