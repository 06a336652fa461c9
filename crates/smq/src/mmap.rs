//! A zero-copy SMQ reading backend, mirroring `smallmind_gguf::mmap`.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{FormatError, SmqError};
use crate::reader::{self, SmqInfo, TensorEntry};

/// Reads an SMQ file via `mmap(2)`; tensor bytes are borrowed directly
/// from the mapping until the caller asks for an owned copy or a decode.
pub struct SmqMmapReader {
    mmap: Mmap,
    info: SmqInfo,
}

impl SmqMmapReader {
    /// Maps and parses the SMQ file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SmqError> {
        let file = File::open(path)?;
        // SAFETY: read-only mapping owned for this reader's lifetime; see
        // the identical caveat in `smallmind_gguf::mmap::MmapReader::open`.
        let mmap = unsafe { Mmap::map(&file)? };
        let info = reader::parse(Cursor::new(&mmap[..]))?;
        Ok(Self { mmap, info })
    }

    /// The parsed header and tensor directory.
    pub fn info(&self) -> &SmqInfo {
        &self.info
    }

    /// Borrows a tensor's encoded bytes directly from the mapping.
    pub fn view(&self, entry: &TensorEntry) -> Result<&[u8], SmqError> {
        let start = entry.offset() as usize;
        let len = entry.size() as usize;
        let end = start
            .checked_add(len)
            .ok_or_else(|| SmqError::Resource(format!("tensor {:?} offset overflow", entry.name())))?;
        self.mmap.get(start..end).ok_or_else(|| {
            SmqError::Format(FormatError::TensorSizeMismatch {
                name: entry.name().to_string(),
                expected: len as u64,
                actual: self.mmap.len().saturating_sub(start) as u64,
            })
        })
    }

    /// Borrows a tensor's encoded bytes by name.
    pub fn view_by_name(&self, name: &str) -> Result<&[u8], SmqError> {
        let entry = self
            .info
            .tensor(name)
            .ok_or_else(|| SmqError::Format(FormatError::TensorNotFound(name.to_string())))?;
        self.view(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::TypedTensor;
    use crate::value::MetadataBag;
    use smallmind_quant::ElementKind;

    #[test]
    fn views_tensor_bytes_zero_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.smq");
        let tensors = vec![TypedTensor::new(
            "w",
            ElementKind::F32,
            vec![2],
            1,
            vec![0, 0, 128, 63, 0, 0, 0, 64],
        )];
        crate::writer::write(&path, &tensors, &MetadataBag::new()).unwrap();

        let reader = SmqMmapReader::open(&path).unwrap();
        let view = reader.view_by_name("w").unwrap();
        assert_eq!(view.len(), 8);
        assert_eq!(f32::from_le_bytes(view[0..4].try_into().unwrap()), 1.0);
    }
}
