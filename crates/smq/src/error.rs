//! Error taxonomy for the SMQ container, mirroring `smallmind_gguf`'s shape
//! (\S10.2: "mirrors `GgufError`'s shape for the private container").

/// A structural violation of the SMQ container format.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The first four bytes were not the SMQ magic.
    #[error("bad SMQ magic: expected {expected:?}, got {found:?}")]
    BadMagic {
        /// The expected magic bytes.
        expected: [u8; 4],
        /// The bytes actually found.
        found: [u8; 4],
    },
    /// An unrecognized metadata value-tag byte.
    #[error("unknown metadata value tag {0} at key {1:?}")]
    UnknownValueTag(u32, String),
    /// An array value whose inner tag was itself `array`.
    #[error("nested arrays are not supported (key {0:?})")]
    NestedArray(String),
    /// An unrecognized tensor element-kind integer in the directory.
    #[error("unknown tensor element kind {0} for tensor {1:?}")]
    UnknownElementKind(u32, String),
    /// A tensor's encoded byte length disagreed with the directory's
    /// recorded size.
    #[error("tensor size mismatch for {name:?}: expected {expected} bytes, got {actual}")]
    TensorSizeMismatch {
        /// Offending tensor name.
        name: String,
        /// Size recorded in the directory.
        expected: u64,
        /// Size actually available.
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
    /// A duplicate tensor name was written.
    #[error("duplicate tensor name {0:?}")]
    DuplicateTensorName(String),
    /// A lookup by name found no matching tensor in the directory.
    #[error("no such tensor {0:?} in container")]
    TensorNotFound(String),
    /// A string field contained invalid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
}

/// Top-level SMQ error.
#[derive(Debug, thiserror::Error)]
pub enum SmqError {
    /// A structural format violation (see [`FormatError`]).
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The file declared an SMQ format version this reader doesn't know.
    #[error("unsupported SMQ version {0}")]
    UnsupportedVersion(u32),
    /// An underlying I/O fault.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A requested size or offset exceeds a platform or configured bound.
    #[error("resource bound exceeded: {0}")]
    Resource(String),
}
