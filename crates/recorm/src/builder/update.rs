use super::{BuiltQuery, QueryState, join_if_not_empty};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;

impl QueryState {
    /// `UPDATE <table> [<joins>] SET <field> = ?, ... WHERE <table>.<id column> = ?`.
    ///
    /// Parameters are the changed values in assignment order, then `id`.
    pub fn build_update(&self, changed: &Row, id_column: &str, id: Value) -> OrmResult<BuiltQuery> {
        self.validate()?;
        if changed.is_empty() {
            return Err(OrmError::validation("UPDATE requires at least one changed field"));
        }

        let sets: Vec<String> = changed
            .columns()
            .map(|c| format!("{} = ?", self.quote(c)))
            .collect();
        let set_clause = format!("SET {}", sets.join(", "));
        let where_clause = format!("WHERE {}.{} = ?", self.table, self.quote(id_column));
        let update = format!("UPDATE {}", self.table);

        let sql = join_if_not_empty([
            update.as_str(),
            self.build_join().as_str(),
            set_clause.as_str(),
            where_clause.as_str(),
        ]);

        let mut params: Vec<Value> = changed.values().cloned().collect();
        params.push(id);
        Ok(BuiltQuery::new(sql, params))
    }
}
