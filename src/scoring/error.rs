use std::fmt;

use thiserror::Error;

/// Why an indicator table does not satisfy the schema it is scored against.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaIssue {
    #[error("column '{0}' not found in indicator table")]
    MissingColumn(String),

    #[error("indicator table has no rows")]
    NoRows,

    #[error("column '{column}' has a non-finite value for '{entity}'")]
    NonFinite { column: String, entity: String },

    /// Listed twice, either within one polarity or as both good and bad
    #[error("column '{0}' is listed more than once")]
    DuplicateColumn(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaIssue),

    #[error("empty column set: at least one good or bad indicator is required")]
    EmptyColumnSet,

    #[error("no entity named '{0}'")]
    UnknownEntity(String),
}

/// Non-fatal: a column is constant across all entities, so every entity
/// gets 0.0 for it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DegenerateColumn {
    pub column: String,
    pub value: f64,
}

impl fmt::Display for DegenerateColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column '{}' is constant ({}) across all entities; normalized to 0.0",
            self.column, self.value
        )
    }
}
