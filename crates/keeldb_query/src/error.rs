//! Error types for the query façade.

use keeldb_core::EngineError;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while building or executing a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The table name is not set.
    #[error("table name is not set")]
    EmptyTable,

    /// Insert was given no values.
    #[error("values are empty, they cannot be empty")]
    EmptyValues,

    /// A field holds a value type the façade does not store.
    #[error("unsupported value type for field {field}")]
    UnsupportedValue {
        /// The offending field.
        field: String,
    },

    /// The predicate operator is not one of `=`, `!=`, `<`, `>`.
    #[error("unsupported operator: {op}")]
    UnsupportedOperator {
        /// The operator as given.
        op: String,
    },

    /// A stored row is not a JSON object.
    #[error("row {key} is not a JSON object")]
    InvalidRow {
        /// The row's engine key.
        key: String,
    },

    /// The underlying engine failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// A row or metadata value failed to encode or decode.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueryError {
    /// Creates an unsupported value error.
    pub fn unsupported_value(field: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            field: field.into(),
        }
    }

    /// Creates an unsupported operator error.
    pub fn unsupported_operator(op: impl Into<String>) -> Self {
        Self::UnsupportedOperator { op: op.into() }
    }
}
