use super::{BuiltQuery, QueryState};
use crate::value::Value;

impl QueryState {
    /// `DELETE FROM <table> WHERE <id column> = ?`.
    pub fn build_delete(&self, id_column: &str, id: Value) -> BuiltQuery {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            self.table,
            self.quote(id_column)
        );
        BuiltQuery::new(sql, vec![id])
    }
}
