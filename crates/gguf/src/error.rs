//! Error taxonomy for the GGUF reader.

use smallmind_quant::QuantError;

/// A structural violation of the GGUF container format.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The first four bytes were not ASCII `"GGUF"`.
    #[error("bad GGUF magic: expected \"GGUF\", got {0:?}")]
    BadMagic([u8; 4]),
    /// An unrecognized value-tag byte in the KV stream.
    #[error("unknown metadata value tag {0} at key {1:?}")]
    UnknownValueTag(u32, String),
    /// An array value whose inner tag was itself `array` (tag 9).
    #[error("nested arrays are not supported (key {0:?})")]
    NestedArray(String),
    /// A tensor's encoded byte length disagreed with the size formula.
    #[error("tensor size mismatch for {name:?}: expected {expected} bytes, got {actual}")]
    TensorSizeMismatch {
        /// Offending tensor name.
        name: String,
        /// Size computed from the declared kind/dimensions.
        expected: u64,
        /// Size actually available in the data section / byte slice.
        actual: u64,
    },
    /// A metadata accessor was called against a value of the wrong tag.
    #[error("wrong value type at {context:?}: found tag {found}")]
    WrongValueType {
        /// The key or accessor name that failed.
        context: String,
        /// The tag that was actually stored.
        found: u32,
    },
    /// A required metadata key was absent.
    #[error("missing required metadata key {0:?}")]
    MissingKey(String),
    /// A tensor's element count was not a valid multiple of its kind's
    /// required block size (K-quants).
    #[error(transparent)]
    Quant(#[from] QuantError),
    /// A string field contained invalid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
}

/// Top-level GGUF reader error.
#[derive(Debug, thiserror::Error)]
pub enum GgufError {
    /// A structural format violation (see [`FormatError`]).
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The file declared a version other than 2 or 3.
    #[error("unsupported GGUF version {0} (supported: 2, 3)")]
    UnsupportedVersion(u32),
    /// An underlying I/O fault (file, mapping, or truncated stream).
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A requested size or offset exceeds a platform or configured bound.
    #[error("resource bound exceeded: {0}")]
    Resource(String),
}
