//! Error types for bridge operations.

use std::path::PathBuf;

use thiserror::Error;

/// Why a bridge call was rejected. None of these are fatal; the bridge state
/// is unchanged after an error unless noted on the operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("framework not initialized")]
    NotInitialized,

    #[error("framework already initialized")]
    AlreadyInitialized,

    #[error("allocation failed: {0}")]
    AllocationFailed(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The handle was valid once but its model has been replaced or disposed.
    #[error("stale or unknown model handle")]
    StaleHandle,

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("model files missing: {}", .0.join(", "))]
    MissingFiles(Vec<String>),

    #[error("invalid moc: {0}")]
    InvalidMoc(String),
}

impl BridgeError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Errors produced while reading a `*.model3.json` manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model manifest parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
