//! Error taxonomy for the bump-decision engine.
//!
//! Two tiers, matching how failures are handled:
//! - [`SourceError`] — a collaborator (commit, release or pull-request
//!   source) failed. Always recoverable: the engine degrades the affected
//!   service to its weakest signal and continues.
//! - [`BossError`] — fatal. Missing or unparsable configuration or state
//!   aborts the run with no state write.

use thiserror::Error;

/// Recoverable failure from an external source collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The transport failed (connection, HTTP status, timeout upstream).
    #[error("transport error for {repo}: {detail}")]
    Transport { repo: String, detail: String },

    /// The response arrived but could not be decoded.
    #[error("decode error for {repo}: {detail}")]
    Decode { repo: String, detail: String },
}

/// Convenience result alias for source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Fatal errors for the decision engine and its persistence.
#[derive(Debug, Error)]
pub enum BossError {
    /// Service configuration is missing or invalid.
    #[error("invalid fleet configuration: {0}")]
    InvalidConfig(String),

    /// The persisted state file was not found (first run requires a seed).
    #[error("state file not found: {path}")]
    StateNotFound { path: String },

    /// The persisted state exists but cannot be used.
    #[error("state file unusable: {0}")]
    StateCorrupt(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure reading or replacing a record.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine and persistence operations.
pub type Result<T> = std::result::Result<T, BossError>;
