//! A seekable, non-mmap backend: reads the header eagerly, then fetches
//! tensor bytes on demand with `seek` + `read_exact`.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{FormatError, GgufError};
use crate::reader::{self, ModelInfo};
use crate::tensor::TensorInfo;

/// Reads a GGUF file through a buffered, seekable file handle. Tensor bytes
/// are copied into an owned `Vec<u8>` on each call; prefer
/// [`crate::mmap::MmapReader`] when the file is local and zero-copy access
/// matters.
pub struct StreamReader<R> {
    inner: BufReader<R>,
    info: ModelInfo,
}

impl StreamReader<File> {
    /// Opens and parses the GGUF file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GgufError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> StreamReader<R> {
    /// Parses a GGUF header from any `Read + Seek` source.
    pub fn from_reader(mut source: R) -> Result<Self, GgufError> {
        source.seek(SeekFrom::Start(0))?;
        let info = reader::parse(&mut source)?;
        Ok(Self {
            inner: BufReader::new(source),
            info,
        })
    }

    /// The parsed header and tensor manifest.
    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Reads one tensor's encoded bytes in full.
    pub fn read_tensor_bytes(&mut self, tensor: &TensorInfo) -> Result<Vec<u8>, GgufError> {
        let mut buf = vec![0u8; tensor.encoded_byte_len() as usize];
        self.inner.seek(SeekFrom::Start(tensor.absolute_offset()))?;
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads one tensor's encoded bytes by name.
    pub fn read_tensor_bytes_by_name(&mut self, name: &str) -> Result<Vec<u8>, GgufError> {
        let tensor = self
            .info
            .tensor(name)
            .ok_or_else(|| GgufError::Format(FormatError::MissingKey(name.to_string())))?
            .clone();
        self.read_tensor_bytes(&tensor)
    }
}
