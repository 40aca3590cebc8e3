//! Error types for extraction.

use pkb_decode::DecodeError;

/// Failures reported to callers.
///
/// Malformed data inside a loaded buffer is never an error here; it shows up
/// as skipped entries or empty results instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No manifest was supplied and the container has no readable directory.
    #[error("no manifest available and container {container:?} has no readable directory")]
    MissingManifest { container: String },

    /// The requested container was never loaded.
    #[error("container {0:?} is not loaded")]
    MissingContainer(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
