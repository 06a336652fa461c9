//! GGUF container reader: header, typed metadata, and the tensor manifest.
//!
//! Parsing (magic/version check, KV bag, tensor-info list, authoritative
//! offset assignment) is shared between backends in [`reader`]; callers
//! pick [`stream::StreamReader`] for any `Read + Seek` source or
//! [`mmap::MmapReader`] for zero-copy access to a local file.

#![deny(missing_docs)]

mod error;
mod mmap;
mod reader;
mod stream;
mod tensor;
mod value;

pub use error::{FormatError, GgufError};
pub use mmap::MmapReader;
pub use reader::{ModelInfo, DEFAULT_ALIGNMENT};
pub use stream::StreamReader;
pub use tensor::TensorInfo;
pub use value::{MetadataBag, Value};

use smallmind_quant::{ElementKind, QuantError};

/// Dequantizes one tensor's encoded bytes into a float buffer, dispatching
/// on [`TensorInfo::element_kind`]. Returns
/// [`QuantError::UnsupportedKind`] for a recognized-but-undecoded kind
/// (`Q5_1`, `Q8_1`, `Q2K..Q8K` minus `Q4K`/`Q6K`, the `IQ*` family).
pub fn decode_tensor(tensor: &TensorInfo, bytes: &[u8]) -> Result<Vec<f32>, QuantError> {
    let count = tensor.element_count() as usize;
    let mut out = vec![0f32; count];
    smallmind_quant::decode(tensor.element_kind(), bytes, count, &mut out)?;
    Ok(out)
}

/// Whether a tensor's kind can be decoded by [`decode_tensor`] /
/// re-quantized by `smallmind-import`.
pub fn is_decodable(kind: ElementKind) -> bool {
    kind.is_decodable()
}
