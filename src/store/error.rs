use thiserror::Error;

/// Errors raised by a document store or template registry
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed the request
    #[error("Document store error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
