use super::{Model, Record};
use crate::builder::{BuiltQuery, JoinOn};
use crate::error::OrmResult;
use crate::ident;
use crate::row::Row;
use crate::value::{Bind, Value};

impl<M: Model> Record<M> {
    // ==================== Fluent configuration ====================

    /// Replace the result columns.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.state_mut().select(columns);
        self
    }

    /// AND-append `<column> <operator> ?`.
    pub fn and_where(&mut self, column: &str, operator: &str, value: impl Into<Bind>) -> &mut Self {
        self.state_mut().and_where(column, operator, value);
        self
    }

    pub fn where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.state_mut().where_eq(column, value);
        self
    }

    /// AND-append a literal fragment with its own `?` placeholders.
    pub fn where_raw(&mut self, fragment: &str, params: Vec<Value>) -> &mut Self {
        self.state_mut().where_raw(fragment, params);
        self
    }

    /// Join the table of model `O`.
    pub fn join<O: Model>(&mut self, kind: &str, on: impl Into<JoinOn>) -> &mut Self {
        let table = ident::table_name(O::NAME, self.state.quote_style());
        self.state_mut().join(kind, &table, on);
        self
    }

    /// Join an arbitrary, already quoted table.
    pub fn join_table(&mut self, kind: &str, table: &str, on: impl Into<JoinOn>) -> &mut Self {
        self.state_mut().join(kind, table, on);
        self
    }

    pub fn group<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.state_mut().group(columns);
        self
    }

    /// Order by `columns`; `direction` must be exactly `ASC` or `DESC`, otherwise
    /// ordering is cleared.
    pub fn order<I, S>(&mut self, columns: I, direction: &str) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.state_mut().order(columns, direction);
        self
    }

    pub fn limit(&mut self, count: u64) -> &mut Self {
        self.state_mut().limit(count);
        self
    }

    pub fn limit_with_offset(&mut self, offset: u64, count: u64) -> &mut Self {
        self.state_mut().limit_with_offset(offset, count);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.state_mut().offset(offset);
        self
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.state_mut().distinct();
        self
    }

    /// Mark this record new; the next `save` inserts it.
    pub fn create(&mut self) -> &mut Self {
        self.is_new = true;
        self
    }

    /// Mark this record new and seed its fields without marking them dirty.
    pub fn create_with(&mut self, fields: Row) -> &mut Self {
        self.is_new = true;
        self.fields = fields;
        self
    }

    // ==================== Reads ====================

    fn fetch(&self) -> OrmResult<Vec<Row>> {
        let query = self.state.build_read()?;
        self.session.query_built(&query, M::NAME)
    }

    /// Fetch the first matching row into this record.
    ///
    /// Returns `Ok(false)` when nothing matched; the record is left untouched.
    pub fn find_one(&mut self) -> OrmResult<bool> {
        self.state_mut().limit(1);
        match self.fetch()?.into_iter().next() {
            Some(row) => {
                self.hydrate(row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Add `<id column> = ?` and fetch the first matching row into this record.
    pub fn find_by_id(&mut self, id: impl Into<Value>) -> OrmResult<bool> {
        let id_column = self.id_column.clone();
        self.state_mut().where_eq(&id_column, id);
        self.find_one()
    }

    /// Fetch every matching row as its own record, in row order.
    ///
    /// Result records share this record's query configuration and are not new.
    pub fn find_many(&mut self) -> OrmResult<Vec<Self>> {
        let rows = self.fetch()?;
        Ok(rows.into_iter().map(|row| self.with_row(row)).collect())
    }

    /// Run a literal statement in place of the assembled SELECT.
    ///
    /// The override stays installed for later reads on this record.
    pub fn raw_query(&mut self, sql: &str, params: Vec<Value>) -> OrmResult<Vec<Self>> {
        self.state_mut().raw(sql, params);
        self.find_many()
    }

    /// Column names of the loaded row, loading one with [`Record::find_one`] when nothing
    /// is loaded yet.
    pub fn columns(&mut self) -> OrmResult<Vec<String>> {
        if self.fields.is_empty() {
            self.find_one()?;
        }
        Ok(self.fields.columns().map(str::to_string).collect())
    }

    // ==================== Inspection ====================

    /// The statement a read would execute.
    pub fn to_select_sql(&self) -> OrmResult<BuiltQuery> {
        self.state.build_read()
    }

    /// The INSERT `save` would execute for a new record.
    pub fn to_insert_sql(&self) -> OrmResult<BuiltQuery> {
        self.state.build_insert(&self.fields)
    }

    /// The UPDATE `save` would execute for the current dirty fields.
    pub fn to_update_sql(&self) -> OrmResult<BuiltQuery> {
        self.state
            .build_update(&self.dirty, &self.id_column, self.id_value())
    }

    pub fn to_delete_sql(&self) -> BuiltQuery {
        self.state.build_delete(&self.id_column, self.id_value())
    }
}
