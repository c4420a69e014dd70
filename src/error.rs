//! Error types with caller-facing classification.

/// Error type for permission management operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Request errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {kind} does not accept {principal} assignments")]
    Forbidden { kind: String, principal: String },

    // Configuration / programming errors
    #[error("Unknown permission level {level:?} for {kind}")]
    UnknownLevel { kind: String, level: String },

    #[error("Resource kind already registered: {0}")]
    DuplicateKind(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Store errors
    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Errors caused by the request itself. The exposing layer reports these
    /// back to the caller instead of treating them as faults.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::NotFound(_) | Error::Forbidden { .. }
        )
    }

    /// Failures of the persistence collaborator, passed through unchanged.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Error::Store(_) | Error::Database(_) | Error::Json(_))
    }
}

/// Result type alias using resperm's Error.
pub type Result<T> = std::result::Result<T, Error>;
