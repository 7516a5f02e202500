use super::{QueryState, placeholder_offsets};
use crate::value::{Bind, Value};

impl QueryState {
    /// Append `<column> <operator> ?` and its bound value.
    ///
    /// A [`Bind::List`] renders one placeholder per element inside parentheses, so
    /// `and_where("id", "IN", vec![1, 2, 3])` yields `` `id` IN (?, ?, ?) ``.
    /// Predicates are AND-combined in call order.
    pub fn and_where(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Bind>,
    ) -> &mut Self {
        let value = value.into();
        let fragment = format!(
            "{} {} {}",
            self.quote(column),
            operator.trim(),
            value.placeholder()
        );
        self.wheres.push((fragment, value));
        self
    }

    /// Append `<column> = ?`.
    pub fn where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.and_where(column, "=", Bind::Scalar(value.into()))
    }

    /// Append a literal predicate fragment with its own `?` placeholders.
    ///
    /// The number of `?` in `fragment` must equal the number of `params`; a `?` inside
    /// quotes is not counted.
    pub fn where_raw(&mut self, fragment: &str, params: Vec<Value>) -> &mut Self {
        let placeholder_count = placeholder_offsets(fragment).len();
        if placeholder_count != params.len() {
            self.build_error = Some(format!(
                "where_raw mismatch: fragment '{}' has {} '?', but {} values provided",
                fragment,
                placeholder_count,
                params.len()
            ));
            return self;
        }
        self.wheres
            .push((fragment.trim().to_string(), Bind::List(params)));
        self
    }

    pub(super) fn build_where(&self) -> (String, Vec<Value>) {
        if self.wheres.is_empty() {
            return (String::new(), Vec::new());
        }
        let fragments: Vec<&str> = self.wheres.iter().map(|(f, _)| f.as_str()).collect();
        let params = self
            .wheres
            .iter()
            .flat_map(|(_, bind)| bind.values().iter().cloned())
            .collect();
        (format!("WHERE {}", fragments.join(" AND ")), params)
    }
}
