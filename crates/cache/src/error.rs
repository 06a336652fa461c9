//! Error taxonomy for the model cache.

/// Errors produced by cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An underlying filesystem fault (copy, create-directory, rename).
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Invalid caller input: an empty source, an unresolvable model id, etc.
    #[error("invalid cache input: {0}")]
    Validation(String),
    /// `manifest.json` existed but could not be parsed as valid JSON in the
    /// expected shape.
    #[error("malformed manifest for {0:?}: {1}")]
    Manifest(String, serde_json::Error),
    /// No cache entry exists for the given model id.
    #[error("no cache entry for model id {0:?}")]
    NotFound(String),
    /// A network fault while downloading a remote source.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// A download exceeded its configured timeout or was cancelled.
    #[error("download of {0:?} was cancelled or timed out")]
    DownloadAborted(String),
}
