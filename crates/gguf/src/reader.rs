//! The shared GGUF parse algorithm (\S4.3), generic over any [`std::io::Read`].
//!
//! Both backends ([`crate::stream::StreamReader`] and [`crate::mmap::MmapReader`])
//! funnel through [`parse`]; only how they later serve tensor *bytes* differs.

use std::io::Read;

use indexmap::IndexMap;
use smallmind_quant::ElementKind;

use crate::error::{FormatError, GgufError};
use crate::tensor::TensorInfo;
use crate::value::{MetadataBag, Value};

const MAGIC: [u8; 4] = *b"GGUF";
/// Default tensor-data alignment when `general.alignment` is absent.
pub const DEFAULT_ALIGNMENT: u32 = 32;

/// A fully parsed GGUF header: format version, alignment, metadata, and the
/// tensor manifest with authoritative absolute offsets already assigned.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    version: u32,
    alignment: u32,
    metadata: MetadataBag,
    tensors: IndexMap<String, TensorInfo>,
    data_section_offset: u64,
    data_section_len: u64,
}

impl ModelInfo {
    /// GGUF format version (2 or 3).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Tensor-data alignment in bytes.
    pub fn alignment(&self) -> u32 {
        self.alignment
    }

    /// The parsed metadata bag.
    pub fn metadata(&self) -> &MetadataBag {
        &self.metadata
    }

    /// Tensors in declaration order.
    pub fn tensors(&self) -> impl Iterator<Item = &TensorInfo> {
        self.tensors.values()
    }

    /// Tensor names in declaration order.
    pub fn tensor_names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(|s| s.as_str())
    }

    /// Looks up a tensor by name.
    pub fn tensor(&self, name: &str) -> Option<&TensorInfo> {
        self.tensors.get(name)
    }

    /// Number of tensors declared.
    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }

    /// Absolute byte offset where the data section begins
    /// (`align_up(end_of_tensor_infos, alignment)`, \S4.3 step 7).
    pub fn data_section_offset(&self) -> u64 {
        self.data_section_offset
    }

    /// Total encoded byte length of the data section (sum of every
    /// tensor's [`TensorInfo::encoded_byte_len`]), used by \S8's
    /// offset-determinism property.
    pub fn data_section_len(&self) -> u64 {
        self.data_section_len
    }
}

fn align_up(value: u64, alignment: u32) -> u64 {
    let alignment = alignment as u64;
    if alignment == 0 {
        return value;
    }
    ((value + alignment - 1) / alignment) * alignment
}

/// A `Read` wrapper that counts bytes consumed, so the parser can compute
/// `align_up(current_position, alignment)` without requiring `Seek`.
struct CountingReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> CountingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }
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

fn read_i8<R: Read>(r: &mut R) -> std::io::Result<i8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0] as i8)
}

fn read_i16<R: Read>(r: &mut R) -> std::io::Result<i16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(i16::from_le_bytes(buf))
}

fn read_i32<R: Read>(r: &mut R) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_i64<R: Read>(r: &mut R) -> std::io::Result<i64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn read_f32<R: Read>(r: &mut R) -> std::io::Result<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

fn read_f64<R: Read>(r: &mut R) -> std::io::Result<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Reads a GGUF "ggstring": a `u64` byte length followed by UTF-8 bytes,
/// with no NUL terminator.
fn read_string<R: Read>(r: &mut R) -> Result<String, GgufError> {
    let len = read_u64(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| GgufError::Format(FormatError::InvalidUtf8))
}

/// Reads one value of the given wire tag. `key` is only used for error
/// messages. Arrays recurse one level; a nested array is rejected.
fn read_value<R: Read>(r: &mut R, tag: u32, key: &str, allow_array: bool) -> Result<Value, GgufError> {
    Ok(match tag {
        0 => Value::U8(read_i8(r)? as u8),
        1 => Value::I8(read_i8(r)?),
        2 => Value::U16({
            let mut buf = [0u8; 2];
            r.read_exact(&mut buf)?;
            u16::from_le_bytes(buf)
        }),
        3 => Value::I16(read_i16(r)?),
        4 => Value::U32(read_u32(r)?),
        5 => Value::I32(read_i32(r)?),
        6 => Value::F32(read_f32(r)?),
        7 => {
            let mut buf = [0u8; 1];
            r.read_exact(&mut buf)?;
            Value::Bool(buf[0] != 0)
        }
        8 => Value::String(read_string(r)?),
        9 => {
            if !allow_array {
                return Err(GgufError::Format(FormatError::NestedArray(key.to_string())));
            }
            let inner_tag = read_u32(r)?;
            if inner_tag == 9 {
                // Reject structurally, not just by recursing: an empty
                // nested array (count == 0) would otherwise never reach
                // the `!allow_array` guard below, since the element loop
                // never runs.
                return Err(GgufError::Format(FormatError::NestedArray(key.to_string())));
            }
            let count = read_u64(r)?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(read_value(r, inner_tag, key, false)?);
            }
            Value::Array(items)
        }
        10 => Value::U64(read_u64(r)?),
        11 => Value::I64(read_i64(r)?),
        12 => Value::F64(read_f64(r)?),
        other => return Err(GgufError::Format(FormatError::UnknownValueTag(other, key.to_string()))),
    })
}

/// Parses a GGUF header and tensor manifest from `reader`, per \S4.3.
///
/// `reader` need not be seekable: the algorithm is a single forward pass
/// over the header, metadata, and tensor-info sections. Serving tensor
/// *bytes* from the data section is the caller's job (see the stream and
/// mmap backends), since that requires either seeking or a mapped view.
pub fn parse<R: Read>(reader: R) -> Result<ModelInfo, GgufError> {
    let mut r = CountingReader::new(reader);

    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(GgufError::Format(FormatError::BadMagic(magic)));
    }

    let version = read_u32(&mut r)?;
    if !(2..=3).contains(&version) {
        return Err(GgufError::UnsupportedVersion(version));
    }

    let tensor_count = read_u64(&mut r)?;
    let metadata_count = read_u64(&mut r)?;

    let mut metadata = MetadataBag::new();
    for _ in 0..metadata_count {
        let key = read_string(&mut r)?;
        let tag = read_u32(&mut r)?;
        let value = read_value(&mut r, tag, &key, true)?;
        log::trace!("gguf metadata: {key} = {value:?}");
        metadata.insert(key, value);
    }

    let alignment = metadata
        .get("general.alignment")
        .map(|v| v.as_u32("general.alignment"))
        .transpose()?
        .unwrap_or(DEFAULT_ALIGNMENT);

    struct RawTensor {
        name: String,
        dims: Vec<u64>,
        kind_value: u32,
        stored_offset: u64,
    }

    let mut raw_tensors = Vec::with_capacity(tensor_count as usize);
    for _ in 0..tensor_count {
        let name = read_string(&mut r)?;
        let n_dims = read_u32(&mut r)? as usize;
        let mut dims = Vec::with_capacity(n_dims);
        for _ in 0..n_dims {
            dims.push(read_u64(&mut r)?);
        }
        let kind_value = read_u32(&mut r)?;
        let stored_offset = read_u64(&mut r)?;
        raw_tensors.push(RawTensor {
            name,
            dims,
            kind_value,
            stored_offset,
        });
    }

    let data_section_offset = align_up(r.position, alignment);

    let mut tensors = IndexMap::with_capacity(raw_tensors.len());
    let mut cursor = data_section_offset;
    for raw in raw_tensors {
        let kind = ElementKind::from_ggml_u32(raw.kind_value).ok_or_else(|| {
            GgufError::Format(FormatError::UnknownValueTag(raw.kind_value, raw.name.clone()))
        })?;
        kind.validate_count(raw.dims.iter().product::<u64>().max(1))
            .map_err(FormatError::from)?;

        let computed_offset = cursor;
        // \S4.3 step 8: the authoritative offset is computed by walking the
        // manifest; any disagreement with `raw.stored_offset` is logged and
        // otherwise ignored, since source files are known to be inconsistent.
        if raw.stored_offset != computed_offset - data_section_offset {
            log::warn!(
                "tensor {:?}: stored relative offset {} disagrees with computed {} (ignored)",
                raw.name,
                raw.stored_offset,
                computed_offset - data_section_offset
            );
        }

        let info = TensorInfo::new(raw.name.clone(), kind, raw.dims, computed_offset);
        cursor += info.encoded_byte_len();
        tensors.insert(raw.name, info);
    }

    let data_section_len = cursor - data_section_offset;

    Ok(ModelInfo {
        version,
        alignment,
        metadata,
        tensors,
        data_section_offset,
        data_section_len,
    })
}
