//! Integration tests for the GGUF reader, mirroring \S8's round-trip and
//! offset-determinism properties against synthetic files.

use proptest::prelude::*;
use smallmind_gguf::StreamReader;

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u64).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Builds a GGUF v3 file with `alignment` and a list of `(name, element_count)`
/// F32 tensors, each filled with zero bytes, in declaration order.
fn build_fixture(alignment: u32, tensors: &[(String, u64)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"GGUF");
    out.extend_from_slice(&3u32.to_le_bytes());
    out.extend_from_slice(&(tensors.len() as u64).to_le_bytes());
    out.extend_from_slice(&1u64.to_le_bytes());

    write_string(&mut out, "general.alignment");
    out.extend_from_slice(&4u32.to_le_bytes());
    out.extend_from_slice(&alignment.to_le_bytes());

    for (name, count) in tensors {
        write_string(&mut out, name);
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // F32
        out.extend_from_slice(&0u64.to_le_bytes()); // stored offset, ignored
    }

    let header_end = out.len() as u64;
    let aligned = ((header_end + alignment as u64 - 1) / alignment as u64) * alignment as u64;
    for _ in header_end..aligned {
        out.push(0);
    }
    for (_, count) in tensors {
        out.extend(std::iter::repeat(0u8).take((*count * 4) as usize));
    }
    out
}

#[test]
fn s3_gguf_v3_synthetic_fixture() {
    let tensors = vec![("x".to_string(), 4u64)];
    let bytes = build_fixture(64, &tensors);
    let mut reader = StreamReader::from_reader(std::io::Cursor::new(bytes)).unwrap();
    assert_eq!(reader.info().alignment(), 64);
    assert_eq!(reader.info().data_section_offset() % 64, 0);
    let tensor = reader.info().tensor("x").unwrap().clone();
    let data = reader.read_tensor_bytes(&tensor).unwrap();
    assert_eq!(data.len(), 16);
}

proptest! {
    /// Tensor absolute offsets are a strictly increasing, contiguous walk
    /// starting at `data_section_offset`, determined only by declaration
    /// order and each kind's byte size — never by the file's own (ignored)
    /// stored relative offsets.
    #[test]
    fn offsets_are_deterministic_given_declaration_order(
        alignment in prop::sample::select(vec![1u32, 4, 16, 32, 64]),
        counts in prop::collection::vec(1u64..64, 1..8),
    ) {
        let tensors: Vec<(String, u64)> = counts
            .iter()
            .enumerate()
            .map(|(i, c)| (format!("t{i}"), *c))
            .collect();
        let bytes = build_fixture(alignment, &tensors);
        let reader = StreamReader::from_reader(std::io::Cursor::new(bytes)).unwrap();
        let info = reader.info();

        let mut expected = info.data_section_offset();
        for (name, count) in &tensors {
            let t = info.tensor(name).unwrap();
            prop_assert_eq!(t.absolute_offset(), expected);
            expected += count * 4;
        }
        prop_assert_eq!(info.data_section_len(), expected - info.data_section_offset());
    }
}
