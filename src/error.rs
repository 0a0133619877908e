// Error types for the query engine.
//
// Every fallible public entry point returns `Result<T>`. The core never
// retries; `ColumnNotFound` and `UnsupportedExpression` both come out of
// plan analysis (see `plan::analyzer`), the rest out of execution.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("unsupported result shape: {0}")]
    UnsupportedResultShape(String),

    #[error("sequence contains no elements")]
    EmptySequence,

    #[error("sequence contains more than one matching element")]
    MultipleElements,

    #[error("dictionary key type mismatch: expected {expected}, got {actual}")]
    DictionaryKeyTypeMismatch { expected: String, actual: String },

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),
}

pub type Result<T> = std::result::Result<T, QueryError>;
