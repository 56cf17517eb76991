//! Error types for the collaborator boundaries
//!
//! Each external dependency of the engine (catalog, embedding backend, storage)
//! reports failures through its own typed error. Callers decide whether a
//! failure skips a step or aborts the operation.

use thiserror::Error;

/// Catalog search or detail call failed
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure (DNS, connection refused, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Release id unknown to the catalog
    #[error("Release not found: {0}")]
    NotFound(String),

    /// Catalog refused the request because of its rate limit
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Any other non-2xx response
    #[error("API error {0}: {1}")]
    Status(u16, String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// HTTP client could not be built
    #[error("Client configuration error: {0}")]
    Config(String),
}

/// Embedding backend failure
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Zero-length image payload
    #[error("Image is empty")]
    EmptyImage,

    /// Bytes are not a decodable image
    #[error("Image cannot be decoded: {0}")]
    UndecodableImage(String),

    /// Backend unreachable or requested device missing
    #[error("Embedding backend unavailable: {0}")]
    Unavailable(String),

    /// `embed` called before `initialize`
    #[error("Embedding model not initialized")]
    NotInitialized,

    /// Backend answered with something other than a vector
    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Storage adapter failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}
