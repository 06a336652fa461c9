//! The shared SMQ parse algorithm, generic over any [`std::io::Read`].
//!
//! Structurally mirrors `smallmind_gguf::reader` (magic/version check,
//! typed KV bag, then a manifest) per \S4.4's "failure modes mirror C3",
//! but the tensor directory additionally carries an explicit `block_size`
//! per entry (see [`crate::tensor::TypedTensor`]).

use std::io::Read;

use indexmap::IndexMap;
use smallmind_quant::ElementKind;

use crate::error::{FormatError, SmqError};
use crate::value::{MetadataBag, Value};

const MAGIC: [u8; 4] = *b"SMQ0";
const VERSION: u32 = 1;
/// Tensor-data alignment; matches the GGUF reader's default so both
/// containers can eventually share a zero-copy mapping strategy.
pub const DATA_ALIGNMENT: u32 = 32;

/// One entry of the SMQ tensor directory.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorEntry {
    name: String,
    kind: ElementKind,
    dims: Vec<u64>,
    block_size: usize,
    offset: u64,
    size: u64,
}

impl TensorEntry {
    /// The tensor's name.
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The tensor's element kind.
    pub fn element_kind(&self) -> ElementKind {
        self.kind
    }
    /// Declared dimensions.
    pub fn dims(&self) -> &[u64] {
        &self.dims
    }
    /// The block size this tensor was encoded with.
    pub fn block_size(&self) -> usize {
        self.block_size
    }
    /// Absolute byte offset of this tensor's data within the file.
    pub fn offset(&self) -> u64 {
        self.offset
    }
    /// Encoded byte length.
    pub fn size(&self) -> u64 {
        self.size
    }
    /// Total element count.
    pub fn element_count(&self) -> u64 {
        self.dims.iter().product::<u64>().max(1)
    }
}

/// A fully parsed SMQ header: metadata and the tensor directory.
#[derive(Debug, Clone)]
pub struct SmqInfo {
    metadata: MetadataBag,
    tensors: IndexMap<String, TensorEntry>,
}

impl SmqInfo {
    /// The parsed metadata bag.
    pub fn metadata(&self) -> &MetadataBag {
        &self.metadata
    }

    /// Tensor directory entries in declaration order.
    pub fn tensors(&self) -> impl Iterator<Item = &TensorEntry> {
        self.tensors.values()
    }

    /// Tensor names in declaration order.
    pub fn tensor_names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(|s| s.as_str())
    }

    /// Looks up a tensor's directory entry by name.
    pub fn tensor(&self, name: &str) -> Option<&TensorEntry> {
        self.tensors.get(name)
    }

    /// Number of tensors declared.
    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }
}

fn align_up(value: u64, alignment: u32) -> u64 {
    let alignment = alignment as u64;
    if alignment == 0 {
        return value;
    }
    ((value + alignment - 1) / alignment) * alignment
}

struct CountingReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

fn read_u32<R: Read>(r: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_string<R: Read>(r: &mut R) -> Result<String, SmqError> {
    let len = read_u64(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| SmqError::Format(FormatError::InvalidUtf8))
}

fn read_value<R: Read>(r: &mut R, tag: u32, key: &str, allow_array: bool) -> Result<Value, SmqError> {
    Ok(match tag {
        0 => Value::U8({
            let mut b = [0u8; 1];
            r.read_exact(&mut b)?;
            b[0]
        }),
        1 => Value::I8({
            let mut b = [0u8; 1];
            r.read_exact(&mut b)?;
            b[0] as i8
        }),
        2 => Value::U16({
            let mut b = [0u8; 2];
            r.read_exact(&mut b)?;
            u16::from_le_bytes(b)
        }),
        3 => Value::I16({
            let mut b = [0u8; 2];
            r.read_exact(&mut b)?;
            i16::from_le_bytes(b)
        }),
        4 => Value::U32(read_u32(r)?),
        5 => Value::I32({
            let mut b = [0u8; 4];
            r.read_exact(&mut b)?;
            i32::from_le_bytes(b)
        }),
        6 => Value::F32({
            let mut b = [0u8; 4];
            r.read_exact(&mut b)?;
            f32::from_le_bytes(b)
        }),
        7 => Value::Bool({
            let mut b = [0u8; 1];
            r.read_exact(&mut b)?;
            b[0] != 0
        }),
        8 => Value::String(read_string(r)?),
        9 => {
            if !allow_array {
                return Err(SmqError::Format(FormatError::NestedArray(key.to_string())));
            }
            let inner_tag = read_u32(r)?;
            let count = read_u64(r)?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(read_value(r, inner_tag, key, false)?);
            }
            Value::Array(items)
        }
        10 => Value::U64(read_u64(r)?),
        11 => Value::I64({
            let mut b = [0u8; 8];
            r.read_exact(&mut b)?;
            i64::from_le_bytes(b)
        }),
        12 => Value::F64({
            let mut b = [0u8; 8];
            r.read_exact(&mut b)?;
            f64::from_le_bytes(b)
        }),
        other => return Err(SmqError::Format(FormatError::UnknownValueTag(other, key.to_string()))),
    })
}

/// Parses an SMQ header and tensor directory from `reader`.
pub fn parse<R: Read>(reader: R) -> Result<SmqInfo, SmqError> {
    let mut r = CountingReader { inner: reader, position: 0 };

    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(SmqError::Format(FormatError::BadMagic {
            expected: MAGIC,
            found: magic,
        }));
    }

    let version = read_u32(&mut r)?;
    if version != VERSION {
        return Err(SmqError::UnsupportedVersion(version));
    }

    let tensor_count = read_u64(&mut r)?;
    let metadata_count = read_u64(&mut r)?;

    let mut metadata = MetadataBag::new();
    for _ in 0..metadata_count {
        let key = read_string(&mut r)?;
        let tag = read_u32(&mut r)?;
        let value = read_value(&mut r, tag, &key, true)?;
        metadata.insert(key, value);
    }

    let mut tensors = IndexMap::with_capacity(tensor_count as usize);
    for _ in 0..tensor_count {
        let name = read_string(&mut r)?;
        let kind_value = read_u32(&mut r)?;
        let kind = ElementKind::from_ggml_u32(kind_value)
            .ok_or_else(|| SmqError::Format(FormatError::UnknownElementKind(kind_value, name.clone())))?;
        let block_size = read_u32(&mut r)? as usize;
        let n_dims = read_u32(&mut r)? as usize;
        let mut dims = Vec::with_capacity(n_dims);
        for _ in 0..n_dims {
            dims.push(read_u64(&mut r)?);
        }
        let offset = read_u64(&mut r)?;
        let size = read_u64(&mut r)?;
        tensors.insert(
            name.clone(),
            TensorEntry {
                name,
                kind,
                dims,
                block_size,
                offset,
                size,
            },
        );
    }

    Ok(SmqInfo { metadata, tensors })
}

pub(crate) fn data_section_offset_after(header_and_directory_len: u64) -> u64 {
    align_up(header_and_directory_len, DATA_ALIGNMENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer;
    use std::io::Cursor;

    #[test]
    fn round_trips_empty_container() {
        let mut buf = Vec::new();
        writer::write_to(&mut buf, &[], &MetadataBag::new()).unwrap();
        let info = parse(Cursor::new(buf)).unwrap();
        assert_eq!(info.tensor_count(), 0);
    }
}
