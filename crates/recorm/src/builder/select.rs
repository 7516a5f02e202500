use super::{BuiltQuery, QueryState, join_if_not_empty};
use crate::error::OrmResult;
use crate::quote::QuoteStyle;
use std::fmt;

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Parse exactly `ASC` or `DESC`; anything else (including lowercase) is `None`.
    pub fn parse(direction: &str) -> Option<Self> {
        match direction {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QueryState {
    fn quote_all<I, S>(&self, columns: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        columns
            .into_iter()
            .map(|c| self.quote(c.as_ref()))
            .collect()
    }

    /// Replace the result columns; each is quoted individually.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns = self.quote_all(columns);
        self
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    /// Replace the GROUP BY columns.
    pub fn group<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.group = self.quote_all(columns);
        self
    }

    /// Replace the ORDER BY columns and direction.
    ///
    /// Only `ASC` and `DESC` are accepted; any other direction clears it, which omits
    /// the ORDER BY clause.
    pub fn order<I, S>(&mut self, columns: I, direction: &str) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.order = self.quote_all(columns);
        self.direction = Direction::parse(direction);
        self
    }

    /// Cap the result at `count` rows.
    ///
    /// An offset set earlier through [`QueryState::limit_with_offset`] is kept, so
    /// capping a paged query still starts at that offset.
    pub fn limit(&mut self, count: u64) -> &mut Self {
        self.limit = Some(count);
        self
    }

    /// Skip `offset` rows, then return `count`.
    ///
    /// Rendered as `LIMIT offset, count` for backtick-quoted drivers and as
    /// `LIMIT count OFFSET offset` for double-quoted ones, which reject the comma form.
    pub fn limit_with_offset(&mut self, offset: u64, count: u64) -> &mut Self {
        self.limit = Some(count);
        self.limit_offset = Some(offset);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    fn build_select_start(&self) -> String {
        let columns = self.columns.join(", ");
        if self.distinct {
            format!("SELECT DISTINCT {} FROM {}", columns, self.table)
        } else {
            format!("SELECT {} FROM {}", columns, self.table)
        }
    }

    fn build_group_by(&self) -> String {
        if self.group.is_empty() {
            return String::new();
        }
        format!("GROUP BY {}", self.group.join(", "))
    }

    fn build_order_by(&self) -> String {
        match self.direction {
            Some(direction) if !self.order.is_empty() => {
                format!("ORDER BY {} {}", self.order.join(", "), direction)
            }
            _ => String::new(),
        }
    }

    fn build_limit(&self) -> String {
        match (self.limit, self.limit_offset) {
            (Some(count), Some(offset)) => match self.style {
                QuoteStyle::Backtick => format!("LIMIT {offset}, {count}"),
                QuoteStyle::Double => format!("LIMIT {count} OFFSET {offset}"),
            },
            (Some(count), None) => format!("LIMIT {count}"),
            (None, _) => String::new(),
        }
    }

    fn build_offset(&self) -> String {
        self.offset
            .map(|offset| format!("OFFSET {offset}"))
            .unwrap_or_default()
    }

    /// Assemble the SELECT statement, ignoring any raw override.
    pub fn build_select(&self) -> OrmResult<BuiltQuery> {
        self.validate()?;
        let (where_clause, params) = self.build_where();
        let sql = join_if_not_empty([
            self.build_select_start().as_str(),
            self.build_join().as_str(),
            where_clause.as_str(),
            self.build_group_by().as_str(),
            self.build_order_by().as_str(),
            self.build_limit().as_str(),
            self.build_offset().as_str(),
        ]);
        Ok(BuiltQuery::new(sql, params))
    }
}
