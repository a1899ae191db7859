//! Error types for geokv.

use thiserror::Error;

/// Errors produced by the geospatial index layer.
#[derive(Error, Debug)]
pub enum GeoKvError {
    /// Missing or inconsistent configuration. Raised before any I/O.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied an argument outside its valid domain.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A user payload could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored item is missing its location or carries an unreadable one.
    #[error("Invalid item attribute '{attribute}': {reason}")]
    InvalidItem { attribute: String, reason: String },

    /// The underlying key-value store rejected or failed a request.
    #[error("Store error: {0}")]
    Store(String),

    /// The requested table has not been provisioned.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// The caller's cancellation handle fired before the operation completed.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeoKvError {
    pub(crate) fn invalid_item(attribute: &str, reason: impl Into<String>) -> Self {
        Self::InvalidItem {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the store rather than from the planner.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store(_) | Self::TableNotFound(_))
    }
}

/// Result type for geokv operations.
pub type Result<T> = std::result::Result<T, GeoKvError>;
