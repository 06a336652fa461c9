//! A seekable, non-mmap SMQ reading backend.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::SmqError;
use crate::reader::{self, SmqInfo, TensorEntry};

/// Reads an SMQ file through a buffered, seekable file handle.
pub struct SmqStreamReader<R> {
    inner: BufReader<R>,
    info: SmqInfo,
}

impl SmqStreamReader<File> {
    /// Opens and parses the SMQ file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SmqError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> SmqStreamReader<R> {
    /// Parses an SMQ header and directory from any `Read + Seek` source.
    pub fn from_reader(mut source: R) -> Result<Self, SmqError> {
        source.seek(SeekFrom::Start(0))?;
        let info = reader::parse(&mut source)?;
        Ok(Self {
            inner: BufReader::new(source),
            info,
        })
    }

    /// The parsed header and tensor directory.
    pub fn info(&self) -> &SmqInfo {
        &self.info
    }

    /// Reads one tensor's encoded bytes in full.
    pub fn read_tensor_bytes(&mut self, entry: &TensorEntry) -> Result<Vec<u8>, SmqError> {
        let mut buf = vec![0u8; entry.size() as usize];
        self.inner.seek(SeekFrom::Start(entry.offset()))?;
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads one tensor's encoded bytes by name.
    pub fn read_tensor_bytes_by_name(&mut self, name: &str) -> Result<Vec<u8>, SmqError> {
        let entry = self
            .info
            .tensor(name)
            .ok_or_else(|| SmqError::Format(crate::error::FormatError::TensorNotFound(name.to_string())))?
            .clone();
        self.read_tensor_bytes(&entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::TypedTensor;
    use crate::value::MetadataBag;
    use smallmind_quant::ElementKind;

    #[test]
    fn reads_tensor_bytes_from_a_real_file() {
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

        let mut reader = SmqStreamReader::open(&path).unwrap();
        let bytes = reader.read_tensor_bytes_by_name("w").unwrap();
        assert_eq!(bytes.len(), 8);
    }

    #[test]
    fn missing_tensor_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.smq");
        crate::writer::write(&path, &[], &MetadataBag::new()).unwrap();
        let mut reader = SmqStreamReader::open(&path).unwrap();
        assert!(reader.read_tensor_bytes_by_name("nope").is_err());
    }
}
