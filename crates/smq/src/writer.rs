//! Serializes a tensor set and metadata bag into the SMQ wire format.
//!
//! Writes happen atomically at the file level (\S3 Lifecycle: "SMQ writes
//! occur atomically ... write to temp, close, rename"): [`write`] spools
//! the whole container to a sibling `.tmp` file, flushes, then renames it
//! into place so no reader ever observes a partial file.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use crate::error::{FormatError, SmqError};
use crate::reader::DATA_ALIGNMENT;
use crate::tensor::TypedTensor;
use crate::value::{MetadataBag, Value};

const MAGIC: [u8; 4] = *b"SMQ0";
const VERSION: u32 = 1;

fn write_string<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    w.write_all(&(s.len() as u64).to_le_bytes())?;
    w.write_all(s.as_bytes())
}

fn write_value<W: Write>(w: &mut W, value: &Value) -> io::Result<()> {
    w.write_all(&value.tag().to_le_bytes())?;
    write_value_payload(w, value)
}

fn write_value_payload<W: Write>(w: &mut W, value: &Value) -> io::Result<()> {
    match value {
        Value::U8(v) => w.write_all(&[*v]),
        Value::I8(v) => w.write_all(&[*v as u8]),
        Value::U16(v) => w.write_all(&v.to_le_bytes()),
        Value::I16(v) => w.write_all(&v.to_le_bytes()),
        Value::U32(v) => w.write_all(&v.to_le_bytes()),
        Value::I32(v) => w.write_all(&v.to_le_bytes()),
        Value::F32(v) => w.write_all(&v.to_le_bytes()),
        Value::Bool(v) => w.write_all(&[if *v { 1 } else { 0 }]),
        Value::String(s) => write_string(w, s),
        Value::Array(items) => {
            let inner_tag = items.first().map(|v| v.tag()).unwrap_or(0);
            w.write_all(&inner_tag.to_le_bytes())?;
            w.write_all(&(items.len() as u64).to_le_bytes())?;
            for item in items {
                write_value_payload(w, item)?;
            }
            Ok(())
        }
        Value::U64(v) => w.write_all(&v.to_le_bytes()),
        Value::I64(v) => w.write_all(&v.to_le_bytes()),
        Value::F64(v) => w.write_all(&v.to_le_bytes()),
    }
}

fn directory_entry_len(t: &TypedTensor) -> u64 {
    8 + t.name().len() as u64 // name
        + 4 // kind
        + 4 // block_size
        + 4 // n_dims
        + 8 * t.dims().len() as u64 // dims
        + 8 // offset
        + 8 // size
}

/// Writes `tensors` (in the given order) and `metadata` into `w` in the
/// SMQ wire format. Used directly by tests and by [`write`]'s temp-file
/// spooling.
pub fn write_to<W: Write>(w: &mut W, tensors: &[TypedTensor], metadata: &MetadataBag) -> Result<(), SmqError> {
    let mut seen = HashSet::with_capacity(tensors.len());
    for t in tensors {
        if !seen.insert(t.name()) {
            return Err(SmqError::Format(FormatError::DuplicateTensorName(t.name().to_string())));
        }
    }

    w.write_all(&MAGIC)?;
    w.write_all(&VERSION.to_le_bytes())?;
    w.write_all(&(tensors.len() as u64).to_le_bytes())?;
    w.write_all(&(metadata.len() as u64).to_le_bytes())?;

    let mut header_len = 4 + 4 + 8 + 8u64;
    let mut meta_buf = Vec::new();
    for (key, value) in metadata.iter() {
        write_string(&mut meta_buf, key)?;
        write_value(&mut meta_buf, value)?;
    }
    header_len += meta_buf.len() as u64;
    w.write_all(&meta_buf)?;

    let directory_len: u64 = tensors.iter().map(directory_entry_len).sum();
    header_len += directory_len;

    let data_section_offset = crate::reader::data_section_offset_after(header_len);

    let mut cursor = data_section_offset;
    for t in tensors {
        write_string(w, t.name())?;
        w.write_all(&t.element_kind().to_ggml_u32().to_le_bytes())?;
        w.write_all(&(t.block_size() as u32).to_le_bytes())?;
        w.write_all(&(t.dims().len() as u32).to_le_bytes())?;
        for d in t.dims() {
            w.write_all(&d.to_le_bytes())?;
        }
        w.write_all(&cursor.to_le_bytes())?;
        w.write_all(&(t.bytes().len() as u64).to_le_bytes())?;
        cursor += t.bytes().len() as u64;
    }

    let written_so_far = header_len;
    for _ in written_so_far..data_section_offset {
        w.write_all(&[0u8])?;
    }

    for t in tensors {
        w.write_all(t.bytes())?;
    }

    Ok(())
}

/// Writes a complete SMQ container to `path`, atomically.
///
/// Spools the full container to `<path>.tmp` in the same directory, then
/// renames it over `path`; concurrent readers of an existing file at
/// `path` either see the old contents or the fully-written new ones, never
/// a partial write (\S5: "manifest.json writes MUST be whole-file
/// replacements").
pub fn write(path: impl AsRef<Path>, tensors: &[TypedTensor], metadata: &MetadataBag) -> Result<(), SmqError> {
    let path = path.as_ref();
    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });

    let mut file = File::create(&tmp_path)?;
    write_to(&mut file, tensors, metadata)?;
    file.flush()?;
    drop(file);
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse;
    use smallmind_quant::ElementKind;
    use std::io::Cursor;

    #[test]
    fn duplicate_names_rejected() {
        let tensors = vec![
            TypedTensor::new("w", ElementKind::F32, vec![1], 1, vec![0, 0, 0, 0]),
            TypedTensor::new("w", ElementKind::F32, vec![1], 1, vec![0, 0, 0, 0]),
        ];
        let mut buf = Vec::new();
        assert!(write_to(&mut buf, &tensors, &MetadataBag::new()).is_err());
    }

    #[test]
    fn single_tensor_round_trips() {
        let tensors = vec![TypedTensor::new(
            "w",
            ElementKind::F32,
            vec![2],
            1,
            vec![0, 0, 128, 63, 0, 0, 0, 64], // 1.0f32, 2.0f32 little-endian
        )];
        let mut metadata = MetadataBag::new();
        metadata.insert("general.architecture", Value::String("llama".to_string()));

        let mut buf = Vec::new();
        write_to(&mut buf, &tensors, &metadata).unwrap();

        let info = parse(Cursor::new(buf)).unwrap();
        assert_eq!(info.tensor_count(), 1);
        assert_eq!(info.metadata().get_str("general.architecture"), Some("llama"));
        let entry = info.tensor("w").unwrap();
        assert_eq!(entry.size(), 8);
        assert_eq!(entry.offset() % DATA_ALIGNMENT as u64, 0);
    }

    #[test]
    fn atomic_file_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.smq");
        let tensors = vec![TypedTensor::new("w", ElementKind::F32, vec![1], 1, vec![0, 0, 0, 0])];
        write(&path, &tensors, &MetadataBag::new()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("smq.tmp").exists());

        let bytes = fs::read(&path).unwrap();
        let info = parse(Cursor::new(bytes)).unwrap();
        assert_eq!(info.tensor_count(), 1);
    }
}
