//! SMQ: the private self-describing multi-tensor container (\S4.4).
//!
//! Semantically identical to GGUF for the closed element-kind set this
//! core supports, but authored by us and versioned independently: a
//! magic, a metadata bag, and a tensor directory, written atomically and
//! read back through either a seekable stream or a zero-copy mapping.

#![deny(missing_docs)]

mod error;
mod mmap;
mod reader;
mod stream;
mod tensor;
mod value;
mod writer;

pub use error::{FormatError, SmqError};
pub use mmap::SmqMmapReader;
pub use reader::{SmqInfo, TensorEntry, DATA_ALIGNMENT};
pub use stream::SmqStreamReader;
pub use tensor::TypedTensor;
pub use value::{MetadataBag, Value};
pub use writer::write;
