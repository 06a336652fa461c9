//! Building a [`crate::Tokenizer`] from a GGUF file's embedded metadata
//! (\S4.7).

use smallmind_gguf::ModelInfo;

use crate::error::TokenizerError;
use crate::vocab::{MergeTable, Vocabulary};
use crate::{SpecialIds, Tokenizer};

/// Caller-supplied overrides for the extraction heuristics, so the
/// byte-level detection in \S4.7 step 5 is "genuinely overridable" rather
/// than only a hard-coded heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenizerOverrides {
    /// Forces the byte-level flag instead of sampling the vocabulary.
    pub byte_level: Option<bool>,
    /// Forces `add_bos` instead of reading `tokenizer.ggml.add_bos_token`.
    pub add_bos: Option<bool>,
}

const BOS_CANDIDATES: &[&str] = &["<s>", "<|startoftext|>", "<bos>"];
const EOS_CANDIDATES: &[&str] = &["</s>", "<|endoftext|>", "<eos>", "<|im_end|>"];
const UNK_CANDIDATES: &[&str] = &["<unk>", "[UNK]"];
const PAD_CANDIDATES: &[&str] = &["<pad>", "[PAD]"];

/// GPT-2's space marker, `Ġ` (U+0120), used by the byte-level heuristic.
const SPACE_MARKER: char = '\u{0120}';

fn resolve_special_id(raw: Option<i32>, vocab: &Vocabulary, candidates: &[&str]) -> Option<u32> {
    match raw {
        // The GGUF sentinel for "absent" is -1; any other negative value
        // is nonsensical but treated the same way rather than panicking.
        Some(v) if v >= 0 => Some(v as u32),
        _ => candidates.iter().find_map(|c| vocab.token_to_id(c)),
    }
}

/// \S4.7 step 5's byte-level heuristic: sample up to the first 1,000
/// vocabulary entries; if more than 10 hits are seen during the scan,
/// short-circuit to `true`; otherwise `true` iff the final count exceeds 5.
fn detect_byte_level(vocab: &Vocabulary) -> bool {
    let sample_len = vocab.len().min(1000);
    let mut hits = 0u32;
    for id in 0..sample_len as u32 {
        let Some(token) = vocab.token_str(id) else {
            continue;
        };
        let is_candidate =
            token.starts_with(SPACE_MARKER) || token.chars().any(|c| ('\u{0100}'..='\u{01FF}').contains(&c));
        if is_candidate {
            hits += 1;
            if hits > 10 {
                return true;
            }
        }
    }
    hits > 5
}

/// Parses `tokenizer.ggml.merges` entries of the form `"left right"`,
/// skipping any line that doesn't split into exactly two parts (\S4.7
/// step 3).
fn parse_merges(lines: Vec<String>) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(lines.len());
    for line in &lines {
        let mut parts = line.split(' ');
        if let (Some(left), Some(right), None) = (parts.next(), parts.next(), parts.next()) {
            pairs.push((left.to_string(), right.to_string()));
        } else {
            log::debug!("skipping malformed merge line {line:?}");
        }
    }
    pairs
}

/// Builds a tokenizer from `info`'s metadata, or `None` if
/// `tokenizer.ggml.model` is absent or not `"gpt2"`/`"llama"`.
pub(crate) fn from_gguf_info(
    info: &ModelInfo,
    overrides: TokenizerOverrides,
) -> Result<Option<Tokenizer>, TokenizerError> {
    let metadata = info.metadata();

    let model = match metadata.get_str("tokenizer.ggml.model") {
        Some(m @ ("gpt2" | "llama")) => m.to_string(),
        _ => return Ok(None),
    };
    log::info!("extracting {model:?} tokenizer from GGUF metadata");

    let tokens = metadata
        .get_string_array("tokenizer.ggml.tokens")
        .ok_or_else(|| TokenizerError::ValidationError("missing tokenizer.ggml.tokens".to_string()))?;
    let vocab = Vocabulary::from_tokens(tokens)?;

    let merge_lines = metadata.get_string_array("tokenizer.ggml.merges").unwrap_or_default();
    let merge_table = MergeTable::from_merges(parse_merges(merge_lines));

    let special = SpecialIds {
        bos: resolve_special_id(metadata.get_i32("tokenizer.ggml.bos_token_id"), &vocab, BOS_CANDIDATES),
        eos: resolve_special_id(metadata.get_i32("tokenizer.ggml.eos_token_id"), &vocab, EOS_CANDIDATES),
        unk: resolve_special_id(metadata.get_i32("tokenizer.ggml.unknown_token_id"), &vocab, UNK_CANDIDATES),
        pad: resolve_special_id(metadata.get_i32("tokenizer.ggml.padding_token_id"), &vocab, PAD_CANDIDATES),
    };

    let byte_level = overrides.byte_level.unwrap_or_else(|| detect_byte_level(&vocab));
    let add_bos = overrides
        .add_bos
        .unwrap_or_else(|| metadata.get_bool_or("tokenizer.ggml.add_bos_token", false));

    Ok(Some(Tokenizer::new(vocab, merge_table, byte_level, special, add_bos)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallmind_gguf::Value;
    use std::io::Cursor;

    fn write_string(out: &mut Vec<u8>, s: &str) {
        out.extend_from_slice(&(s.len() as u64).to_le_bytes());
        out.extend_from_slice(s.as_bytes());
    }

    fn write_value(out: &mut Vec<u8>, value: &Value) {
        match value {
            Value::String(s) => {
                out.extend_from_slice(&8u32.to_le_bytes());
                write_string(out, s);
            }
            Value::I32(v) => {
                out.extend_from_slice(&5u32.to_le_bytes());
                out.extend_from_slice(&v.to_le_bytes());
            }
            Value::Bool(v) => {
                out.extend_from_slice(&7u32.to_le_bytes());
                out.push(if *v { 1 } else { 0 });
            }
            Value::Array(items) => {
                out.extend_from_slice(&9u32.to_le_bytes());
                out.extend_from_slice(&8u32.to_le_bytes()); // inner tag: string
                out.extend_from_slice(&(items.len() as u64).to_le_bytes());
                for item in items {
                    if let Value::String(s) = item {
                        write_string(out, s);
                    } else {
                        panic!("test fixture only supports string array elements");
                    }
                }
            }
            other => panic!("test fixture doesn't support {other:?}"),
        }
    }

    fn build_fixture(entries: &[(&str, Value)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"GGUF");
        out.extend_from_slice(&3u32.to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes()); // tensor_count
        out.extend_from_slice(&(entries.len() as u64).to_le_bytes());
        for (key, value) in entries {
            write_string(&mut out, key);
            write_value(&mut out, value);
        }
        out
    }

    fn string_array(items: &[&str]) -> Value {
        Value::Array(items.iter().map(|s| Value::String(s.to_string())).collect())
    }

    #[test]
    fn absent_tokenizer_model_returns_none() {
        let bytes = build_fixture(&[]);
        let info = smallmind_gguf::StreamReader::from_reader(Cursor::new(bytes)).unwrap();
        let result = from_gguf_info(info.info(), TokenizerOverrides::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn unrecognized_tokenizer_model_returns_none() {
        let bytes = build_fixture(&[("tokenizer.ggml.model", Value::String("sentencepiece".into()))]);
        let info = smallmind_gguf::StreamReader::from_reader(Cursor::new(bytes)).unwrap();
        assert!(from_gguf_info(info.info(), TokenizerOverrides::default()).unwrap().is_none());
    }

    #[test]
    fn builds_llama_tokenizer_with_special_id_fallback() {
        let bytes = build_fixture(&[
            ("tokenizer.ggml.model", Value::String("llama".into())),
            ("tokenizer.ggml.tokens", string_array(&["<unk>", "<s>", "</s>", "a", "b"])),
            ("tokenizer.ggml.merges", string_array(&["a b"])),
        ]);
        let info = smallmind_gguf::StreamReader::from_reader(Cursor::new(bytes)).unwrap();
        let tok = from_gguf_info(info.info(), TokenizerOverrides::default()).unwrap().unwrap();
        assert_eq!(tok.vocab_size(), 5);
        assert_eq!(tok.special_ids().bos, Some(1));
        assert_eq!(tok.special_ids().eos, Some(2));
        assert_eq!(tok.special_ids().unk, Some(0));
        assert!(!tok.is_byte_level());
    }

    #[test]
    fn skips_malformed_merge_lines() {
        assert_eq!(parse_merges(vec!["a b".into(), "onepart".into(), "a b c".into()]), vec![("a".into(), "b".into())]);
    }

    #[test]
    fn byte_level_override_forces_detection_result() {
        let bytes = build_fixture(&[
            ("tokenizer.ggml.model", Value::String("gpt2".into())),
            ("tokenizer.ggml.tokens", string_array(&["a", "b"])),
        ]);
        let info = smallmind_gguf::StreamReader::from_reader(Cursor::new(bytes)).unwrap();
        let overrides = TokenizerOverrides {
            byte_level: Some(true),
            ..Default::default()
        };
        let tok = from_gguf_info(info.info(), overrides).unwrap().unwrap();
        assert!(tok.is_byte_level());
    }

    #[test]
    fn detect_byte_level_counts_space_marker_and_latin_extended() {
        let tokens: Vec<String> = (0..20).map(|i| format!("{SPACE_MARKER}tok{i}")).collect();
        let vocab = Vocabulary::from_tokens(tokens).unwrap();
        assert!(detect_byte_level(&vocab));
    }

    #[test]
    fn detect_byte_level_false_for_plain_ascii_vocab() {
        let vocab = Vocabulary::from_tokens(vec!["hello".into(), "world".into()]).unwrap();
        assert!(!detect_byte_level(&vocab));
    }
}
