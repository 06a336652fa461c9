//! GGUF -> SMQ importer (\S4.5): decodes every tensor this core supports,
//! re-quantizing the two legacy block-32 kinds to a private block size and
//! passing the rest through natively, and carries forward a small
//! allowlist of architecture and tokenizer metadata.

#![deny(missing_docs)]

mod arch;
mod error;
mod metadata;

pub use arch::ModelArchitectureHint;
pub use error::ImportError;

use std::path::Path;

use smallmind_gguf::{ModelInfo, StreamReader, TensorInfo};
use smallmind_quant::{ElementKind, DEFAULT_PRIVATE_BLOCK_SIZE};
use smallmind_smq::TypedTensor;

/// Re-quantizes or passes through one tensor's bytes, returning the output
/// bytes and the block size they were encoded with.
///
/// `Q8_0`/`Q4_0` are dequantized from their foreign block-32 layout and
/// re-encoded at `private_block_size` (\S4.2's re-quantization contract);
/// every other decodable kind is carried through byte-for-byte, keeping
/// its native block size.
fn convert_tensor_bytes(
    kind: ElementKind,
    bytes: Vec<u8>,
    element_count: usize,
    private_block_size: usize,
) -> Result<(Vec<u8>, usize), ImportError> {
    match kind {
        ElementKind::Q8_0 => {
            let mut floats = vec![0f32; element_count];
            smallmind_quant::decode_q8_0_block32(&bytes, element_count, &mut floats)?;
            let mut out = Vec::new();
            smallmind_quant::encode_q8_0(&floats, private_block_size, &mut out);
            Ok((out, private_block_size))
        }
        ElementKind::Q4_0 => {
            let mut floats = vec![0f32; element_count];
            smallmind_quant::decode_q4_0_block32(&bytes, element_count, &mut floats)?;
            let mut out = Vec::new();
            smallmind_quant::encode_q4_0(&floats, private_block_size, &mut out);
            Ok((out, private_block_size))
        }
        ElementKind::F32 | ElementKind::F16 | ElementKind::Q4_1 | ElementKind::Q5_0 | ElementKind::Q4K | ElementKind::Q6K => {
            Ok((bytes, kind.block_size()))
        }
        other => Err(ImportError::UnsupportedKindBatch(vec![("<unknown>".to_string(), other)])),
    }
}

fn collect_unsupported(info: &ModelInfo) -> Vec<(String, ElementKind)> {
    info.tensors()
        .filter(|t| !t.element_kind().is_decodable())
        .map(|t| (t.name().to_string(), t.element_kind()))
        .collect()
}

fn build_typed_tensor(
    reader: &mut StreamReader<std::fs::File>,
    tensor: &TensorInfo,
    private_block_size: usize,
) -> Result<TypedTensor, ImportError> {
    let bytes = reader.read_tensor_bytes(tensor)?;
    let (out_bytes, out_block_size) =
        convert_tensor_bytes(tensor.element_kind(), bytes, tensor.element_count() as usize, private_block_size)?;
    Ok(TypedTensor::new(
        tensor.name().to_string(),
        tensor.element_kind(),
        tensor.dims().to_vec(),
        out_block_size,
        out_bytes,
    ))
}

/// Imports the GGUF file at `gguf_path` into a freshly written SMQ
/// container at `smq_path`, using [`DEFAULT_PRIVATE_BLOCK_SIZE`] as the
/// re-quantization target.
///
/// Implements \S4.5 exactly: every unsupported-kind tensor is collected
/// first and reported together (never a partial import), then every
/// supported tensor is decoded/re-quantized in GGUF declaration order and
/// written to `smq_path` atomically.
pub fn import(gguf_path: impl AsRef<Path>, smq_path: impl AsRef<Path>) -> Result<(), ImportError> {
    import_with_block_size(gguf_path, smq_path, DEFAULT_PRIVATE_BLOCK_SIZE)
}

/// As [`import`], but with an explicit private re-quantization block size
/// instead of [`DEFAULT_PRIVATE_BLOCK_SIZE`].
pub fn import_with_block_size(
    gguf_path: impl AsRef<Path>,
    smq_path: impl AsRef<Path>,
    private_block_size: usize,
) -> Result<(), ImportError> {
    let gguf_path = gguf_path.as_ref();
    let mut reader = StreamReader::open(gguf_path)?;
    let info = reader.info().clone();

    let unsupported = collect_unsupported(&info);
    if !unsupported.is_empty() {
        log::error!(
            "import of {gguf_path:?} aborted: {} tensor(s) use an unsupported element kind",
            unsupported.len()
        );
        return Err(ImportError::UnsupportedKindBatch(unsupported));
    }

    log::info!("importing {} tensors from {gguf_path:?}", info.tensor_count());

    let mut typed_tensors = Vec::with_capacity(info.tensor_count());
    for tensor in info.tensors() {
        typed_tensors.push(build_typed_tensor(&mut reader, tensor, private_block_size)?);
    }

    let conversion_date = chrono::Utc::now().to_rfc3339();
    let output_metadata = metadata::build_output_metadata(info.metadata(), &conversion_date);

    smallmind_smq::write(smq_path.as_ref(), &typed_tensors, &output_metadata)?;
    log::info!("wrote {:?}: {} tensors", smq_path.as_ref(), typed_tensors.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallmind_gguf::Value as GValue;

    fn write_string(out: &mut Vec<u8>, s: &str) {
        out.extend_from_slice(&(s.len() as u64).to_le_bytes());
        out.extend_from_slice(s.as_bytes());
    }

    /// A minimal v3 GGUF fixture with one F32 tensor and one Q8_0 tensor
    /// (exercising both the passthrough and the re-quantization paths).
    fn build_fixture() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"GGUF");
        out.extend_from_slice(&3u32.to_le_bytes());
        out.extend_from_slice(&2u64.to_le_bytes()); // tensor_count
        out.extend_from_slice(&1u64.to_le_bytes()); // metadata_count

        write_string(&mut out, "general.architecture");
        out.extend_from_slice(&8u32.to_le_bytes());
        write_string(&mut out, "llama");

        write_string(&mut out, "w_f32");
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&4u64.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // F32
        out.extend_from_slice(&0u64.to_le_bytes());

        write_string(&mut out, "w_q8_0");
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&32u64.to_le_bytes());
        out.extend_from_slice(&8u32.to_le_bytes()); // Q8_0
        out.extend_from_slice(&0u64.to_le_bytes());

        while out.len() % 32 != 0 {
            out.push(0);
        }
        for v in [1.0f32, 2.0, 3.0, 4.0] {
            out.extend_from_slice(&v.to_le_bytes());
        }

        // A Q8_0 block: fp16 scale (1.0) + 32 signed bytes.
        out.extend_from_slice(&smallmind_fp16::float_to_half(1.0).to_le_bytes());
        for i in 0..32u8 {
            out.push(i);
        }
        out
    }

    #[test]
    fn imports_passthrough_and_requantized_tensors() {
        let gguf_dir = tempfile::tempdir().unwrap();
        let gguf_path = gguf_dir.path().join("model.gguf");
        std::fs::write(&gguf_path, build_fixture()).unwrap();

        let smq_path = gguf_dir.path().join("model.smq");
        import(&gguf_path, &smq_path).unwrap();

        let mut out_reader = smallmind_smq::SmqStreamReader::open(&smq_path).unwrap();
        let info = out_reader.info().clone();
        assert_eq!(info.metadata().get_str("general.architecture"), Some("llama"));
        assert_eq!(info.metadata().get_str("converted_from"), Some("GGUF"));
        assert!(info.metadata().get_str("conversion_date").is_some());

        let f32_entry = info.tensor("w_f32").unwrap().clone();
        assert_eq!(f32_entry.element_kind(), ElementKind::F32);
        let f32_bytes = out_reader.read_tensor_bytes(&f32_entry).unwrap();
        let mut floats = vec![0f32; 4];
        smallmind_quant::decode_with_block(ElementKind::F32, &f32_bytes, 4, &mut floats, f32_entry.block_size()).unwrap();
        assert_eq!(floats, vec![1.0, 2.0, 3.0, 4.0]);

        let q8_entry = info.tensor("w_q8_0").unwrap();
        assert_eq!(q8_entry.element_kind(), ElementKind::Q8_0);
        assert_eq!(q8_entry.block_size(), DEFAULT_PRIVATE_BLOCK_SIZE);
    }

    #[test]
    fn aborts_on_any_unsupported_kind_without_partial_write() {
        let mut out = Vec::new();
        out.extend_from_slice(b"GGUF");
        out.extend_from_slice(&3u32.to_le_bytes());
        out.extend_from_slice(&1u64.to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes());
        write_string(&mut out, "w_q5_1");
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&32u64.to_le_bytes());
        out.extend_from_slice(&7u32.to_le_bytes()); // Q5_1, recognized but undecodable
        out.extend_from_slice(&0u64.to_le_bytes());
        while out.len() % 32 != 0 {
            out.push(0);
        }
        out.extend(std::iter::repeat(0u8).take(36));

        let dir = tempfile::tempdir().unwrap();
        let gguf_path = dir.path().join("model.gguf");
        std::fs::write(&gguf_path, out).unwrap();
        let smq_path = dir.path().join("model.smq");

        let err = import(&gguf_path, &smq_path).unwrap_err();
        match err {
            ImportError::UnsupportedKindBatch(kinds) => {
                assert_eq!(kinds, vec![("w_q5_1".to_string(), ElementKind::Q5_1)]);
            }
            other => panic!("expected UnsupportedKindBatch, got {other:?}"),
        }
        assert!(!smq_path.exists());
    }

    #[test]
    fn carries_forward_general_and_tokenizer_keys_only() {
        let mut source = smallmind_gguf::MetadataBag::new();
        source.insert("general.architecture", GValue::String("llama".to_string()));
        source.insert("llama.context_length", GValue::U32(2048));
        source.insert("llama.not_allowlisted", GValue::U32(1));
        let out = metadata::build_output_metadata(&source, "2026-01-01T00:00:00Z");
        assert_eq!(out.get_u32("llama.context_length"), Some(2048));
        assert!(out.get("llama.not_allowlisted").is_none());
    }
}
