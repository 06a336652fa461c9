//! Converts a [`smallmind_gguf::MetadataBag`] entry into its
//! [`smallmind_smq::Value`] equivalent. The two tag sets are identical
//! (\S4.4), so this is a structural walk with no coercion.

fn convert_value(value: &smallmind_gguf::Value) -> smallmind_smq::Value {
    use smallmind_gguf::Value as G;
    use smallmind_smq::Value as S;
    match value {
        G::U8(v) => S::U8(*v),
        G::I8(v) => S::I8(*v),
        G::U16(v) => S::U16(*v),
        G::I16(v) => S::I16(*v),
        G::U32(v) => S::U32(*v),
        G::I32(v) => S::I32(*v),
        G::U64(v) => S::U64(*v),
        G::I64(v) => S::I64(*v),
        G::F32(v) => S::F32(*v),
        G::F64(v) => S::F64(*v),
        G::Bool(v) => S::Bool(*v),
        G::String(v) => S::String(v.clone()),
        G::Array(items) => S::Array(items.iter().map(convert_value).collect()),
    }
}

/// Builds the destination SMQ metadata bag: every `(general.*, tokenizer.ggml.*,
/// <architecture>.*)` key [`crate::arch::is_allowed_metadata_key`] admits,
/// converted verbatim, plus the two provenance keys \S11 item 7 adds
/// (`converted_from`, `conversion_date`).
pub fn build_output_metadata(source: &smallmind_gguf::MetadataBag, conversion_date: &str) -> smallmind_smq::MetadataBag {
    let architecture = source.get_str("general.architecture");
    let mut out = smallmind_smq::MetadataBag::new();
    for (key, value) in source.iter() {
        if crate::arch::is_allowed_metadata_key(key, architecture) {
            out.insert(key, convert_value(value));
        }
    }
    out.insert("converted_from", smallmind_smq::Value::String("GGUF".to_string()));
    out.insert("conversion_date", smallmind_smq::Value::String(conversion_date.to_string()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallmind_gguf::{MetadataBag, Value as GValue};

    #[test]
    fn carries_allowlisted_keys_and_drops_the_rest() {
        let mut source = MetadataBag::new();
        source.insert("general.architecture", GValue::String("llama".to_string()));
        source.insert("llama.context_length", GValue::U32(2048));
        source.insert("llama.unrelated", GValue::U32(7));
        source.insert("tokenizer.ggml.model", GValue::String("llama".to_string()));

        let out = build_output_metadata(&source, "2026-01-01T00:00:00Z");
        assert_eq!(out.get_str("general.architecture"), Some("llama"));
        assert_eq!(out.get_u32("llama.context_length"), Some(2048));
        assert_eq!(out.get_str("tokenizer.ggml.model"), Some("llama"));
        assert!(out.get("llama.unrelated").is_none());
        assert_eq!(out.get_str("converted_from"), Some("GGUF"));
        assert_eq!(out.get_str("conversion_date"), Some("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn converts_string_arrays() {
        let mut source = MetadataBag::new();
        source.insert(
            "tokenizer.ggml.tokens",
            GValue::Array(vec![GValue::String("a".to_string()), GValue::String("b".to_string())]),
        );
        let out = build_output_metadata(&source, "2026-01-01T00:00:00Z");
        assert_eq!(out.get_string_array("tokenizer.ggml.tokens"), Some(vec!["a".to_string(), "b".to_string()]));
    }
}
