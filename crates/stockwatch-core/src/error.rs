use thiserror::Error;

/// Validation errors raised while constructing domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Stock symbol is required")]
    EmptySymbol,
    #[error("Invalid stock symbol format: {value}. Please use 1-5 uppercase letters.")]
    InvalidSymbol { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("'{value}' is not a valid decimal price")]
    InvalidDecimal { value: String },
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("symbol {symbol} appears more than once in the watchlist")]
    DuplicateSymbol { symbol: String },
}

/// Errors raised by snapshot storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage key '{key}' may only contain ASCII letters, digits, '.', '-' or '_'")]
    InvalidKey { key: String },

    #[error("storage i/o error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
