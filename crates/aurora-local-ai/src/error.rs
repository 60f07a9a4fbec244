//! Errors from on-device inference.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocalAIError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// llama-server answered with a non-success status or an error event.
    #[error("llama-server error: {0}")]
    Api(String),

    #[error("llama-server is not reachable at {0}")]
    ServerNotRunning(String),

    #[error("could not launch llama-server: {0}")]
    ServerStartFailed(String),

    #[error("llama-server binary not found at {0}")]
    ServerBinaryNotFound(String),

    #[error("llama-server did not become ready in time")]
    ServerStartTimeout,

    /// The id is not in [`crate::ModelManager::registry`].
    #[error("no on-device model named '{0}'")]
    UnknownModel(String),

    #[error("model {0} is not downloaded; fetch it with `aurora model pull`")]
    ModelNotFound(String),

    #[error("model download failed: {0}")]
    DownloadFailed(String),

    /// Downloaded bytes do not hash to the registry checksum.
    #[error("checksum mismatch for downloaded model (expected {expected}, got {actual})")]
    ChecksumMismatch { expected: String, actual: String },
}
