use super::{BuiltQuery, QueryState};
use crate::error::OrmResult;
use crate::quote::QuoteStyle;
use crate::row::Row;

impl QueryState {
    /// `INSERT INTO <table> (<fields>) VALUES (?, ...)`, one placeholder per field, with
    /// the parameters in field order.
    ///
    /// An empty field mapping inserts a row of defaults.
    pub fn build_insert(&self, fields: &Row) -> OrmResult<BuiltQuery> {
        if fields.is_empty() {
            let sql = match self.style {
                QuoteStyle::Double => format!("INSERT INTO {} DEFAULT VALUES", self.table),
                QuoteStyle::Backtick => format!("INSERT INTO {} () VALUES ()", self.table),
            };
            return Ok(BuiltQuery::new(sql, Vec::new()));
        }

        let names: Vec<String> = fields.columns().map(|c| self.quote(c)).collect();
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            names.join(", "),
            placeholders
        );
        Ok(BuiltQuery::new(sql, fields.values().cloned().collect()))
    }
}
