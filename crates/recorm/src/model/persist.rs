use super::{Model, Record};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

impl<M: Model> Record<M> {
    /// Persist this record.
    ///
    /// - New records are inserted from the full field mapping. If the id column is
    ///   still unset afterwards, the generated id is read back and assigned through
    ///   [`Record::set`], which leaves the id column dirty. The insert is committed
    ///   by then, so a failed id read is logged and the id is left unset; `save`
    ///   still succeeds.
    /// - Persisted records with no dirty fields are a no-op.
    /// - Otherwise the dirty fields are updated by id.
    ///
    /// On failure the record is left unchanged.
    pub fn save(&mut self) -> OrmResult<()> {
        if !self.session.has_connection() {
            return Err(OrmError::NoConnection);
        }

        if self.is_new {
            let query = self.state.build_insert(&self.fields)?;
            self.session.execute_built(&query, M::NAME)?;
            self.is_new = false;
            self.dirty.clear();

            if self.id().is_none_or(Value::is_null) {
                match self.session.generated_id(Some(M::NAME)) {
                    Ok(Some(id)) => {
                        let id_column = self.id_column.clone();
                        self.set(&id_column, id);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(
                        target: "recorm.session",
                        model = M::NAME,
                        error = %e,
                        "row inserted but its generated id could not be read"
                    ),
                }
            }
            return Ok(());
        }

        if self.dirty.is_empty() {
            return Ok(());
        }

        let query = self
            .state
            .build_update(&self.dirty, &self.id_column, self.id_value())?;
        self.session.execute_built(&query, M::NAME)?;
        self.dirty.clear();
        Ok(())
    }

    /// Delete the row with this record's id and return the affected row count.
    ///
    /// The record itself is not modified.
    pub fn delete(&self) -> OrmResult<u64> {
        let query = self.state.build_delete(&self.id_column, self.id_value());
        self.session.execute_built(&query, M::NAME)
    }
}
