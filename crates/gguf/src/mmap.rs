//! A zero-copy backend: maps the whole file and parses the header out of
//! the mapping itself, then serves tensor data as borrowed slices.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{FormatError, GgufError};
use crate::reader::{self, ModelInfo};
use crate::tensor::TensorInfo;

/// Reads a GGUF file via `mmap(2)`. Tensor bytes are borrowed directly from
/// the mapping — no copy, no decode — until the caller asks for one.
pub struct MmapReader {
    mmap: Mmap,
    info: ModelInfo,
}

impl MmapReader {
    /// Maps and parses the GGUF file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GgufError> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and this reader owns `file`'s
        // descriptor for the mapping's lifetime; external truncation of the
        // backing file while mapped is a documented hazard of `mmap`, not a
        // safety violation this crate can prevent.
        let mmap = unsafe { Mmap::map(&file)? };
        let info = reader::parse(Cursor::new(&mmap[..]))?;
        Ok(Self { mmap, info })
    }

    /// The parsed header and tensor manifest.
    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Borrows a tensor's encoded bytes directly from the mapping, tied to
    /// `self`'s lifetime.
    pub fn view(&self, tensor: &TensorInfo) -> Result<&[u8], GgufError> {
        let start = tensor.absolute_offset() as usize;
        let len = tensor.encoded_byte_len() as usize;
        let end = start
            .checked_add(len)
            .ok_or_else(|| GgufError::Resource(format!("tensor {:?} offset overflow", tensor.name())))?;
        self.mmap.get(start..end).ok_or_else(|| {
            GgufError::Format(FormatError::TensorSizeMismatch {
                name: tensor.name().to_string(),
                expected: len as u64,
                actual: self.mmap.len().saturating_sub(start) as u64,
            })
        })
    }

    /// Borrows a tensor's encoded bytes by name.
    pub fn view_by_name(&self, name: &str) -> Result<&[u8], GgufError> {
        let tensor = self
            .info
            .tensor(name)
            .ok_or_else(|| GgufError::Format(FormatError::MissingKey(name.to_string())))?;
        self.view(tensor)
    }

    /// Raw access to the full mapping, for callers that want to hand the
    /// whole file to another zero-copy consumer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }
}
