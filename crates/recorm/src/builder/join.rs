use super::QueryState;

/// One `<left> <operator> <right>` join condition, optionally preceded by a boolean
/// connector (`AND`, `OR`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    pub connector: Option<String>,
    pub left: String,
    pub operator: String,
    pub right: String,
}

/// The `ON` part of a join.
///
/// `Raw` is emitted verbatim. Each [`JoinCondition`] qualifies its left column with the
/// current table and its right column with the most recently joined table that has
/// not been consumed yet, so join declaration order and condition order are coupled:
///
/// ```ignore
/// state.join("inner", "`post`", JoinOn::on("id_user", "=", "author_id"));
/// // INNER JOIN `post` ON `user`.`id_user` = `post`.`author_id`
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOn {
    Raw(String),
    Conditions(Vec<JoinCondition>),
}

impl JoinOn {
    pub fn raw(fragment: impl Into<String>) -> Self {
        Self::Raw(fragment.into())
    }

    /// A single unconnected condition.
    pub fn on(left: &str, operator: &str, right: &str) -> Self {
        Self::Conditions(vec![JoinCondition {
            connector: None,
            left: left.to_string(),
            operator: operator.to_string(),
            right: right.to_string(),
        }])
    }

    pub fn and(self, left: &str, operator: &str, right: &str) -> Self {
        self.push("AND", left, operator, right)
    }

    pub fn or(self, left: &str, operator: &str, right: &str) -> Self {
        self.push("OR", left, operator, right)
    }

    fn push(self, connector: &str, left: &str, operator: &str, right: &str) -> Self {
        let condition = JoinCondition {
            connector: Some(connector.to_string()),
            left: left.to_string(),
            operator: operator.to_string(),
            right: right.to_string(),
        };
        match self {
            Self::Conditions(mut list) => {
                list.push(condition);
                Self::Conditions(list)
            }
            Self::Raw(raw) => Self::Raw(format!(
                "{raw} {connector} {left} {} {right}",
                operator.trim()
            )),
        }
    }
}

impl From<&str> for JoinOn {
    fn from(fragment: &str) -> Self {
        Self::Raw(fragment.to_string())
    }
}

impl From<String> for JoinOn {
    fn from(fragment: String) -> Self {
        Self::Raw(fragment)
    }
}

impl QueryState {
    /// Add `<KIND> JOIN <table> ON <conditions>`.
    ///
    /// `kind` is upper-cased and suffixed with `JOIN` (`"left"` → `LEFT JOIN`).
    /// `table` must already be quoted.
    pub fn join(&mut self, kind: &str, table: &str, on: impl Into<JoinOn>) -> &mut Self {
        let kind = format!("{} JOIN", kind.to_uppercase()).trim().to_string();
        self.join_tables.push(table.to_string());

        let on = match on.into() {
            JoinOn::Raw(raw) => raw,
            JoinOn::Conditions(conditions) => {
                let mut rendered = Vec::with_capacity(conditions.len());
                for condition in &conditions {
                    match self.render_join_condition(condition) {
                        Some(text) => rendered.push(text),
                        None => {
                            self.build_error = Some(format!(
                                "join condition '{} {} {}' has no joined table to qualify it",
                                condition.left, condition.operator, condition.right
                            ));
                            return self;
                        }
                    }
                }
                rendered.join(" ")
            }
        };

        self.joins.push(format!("{kind} {table} ON {on}"));
        self
    }

    fn render_join_condition(&mut self, condition: &JoinCondition) -> Option<String> {
        let join_table = self.join_tables.pop()?;
        let left = format!("{}.{}", self.table, self.quote(&condition.left));
        let right = format!("{}.{}", join_table, self.quote(&condition.right));
        let connector = condition
            .connector
            .as_deref()
            .map(|c| format!("{} ", c.trim()))
            .unwrap_or_default();
        Some(format!(
            "{connector}{left} {} {right}",
            condition.operator.trim()
        ))
    }

    pub(super) fn build_join(&self) -> String {
        self.joins.join(" ")
    }
}
