//! Architecture-shape metadata carried forward from GGUF into SMQ (\S11
//! item 3): a small, explicit allowlist rather than copying every
//! `<arch>.*` key blindly.

use smallmind_gguf::MetadataBag;

/// The `<arch>.*` key suffixes this crate recognizes and carries forward,
/// using the naming convention GGUF producers have standardized on (e.g.
/// `llama.context_length`, `llama.attention.head_count`).
const SHAPE_KEY_SUFFIXES: &[&str] = &[
    "context_length",
    "embedding_length",
    "block_count",
    "feed_forward_length",
    "attention.head_count",
    "attention.head_count_kv",
    "attention.layer_norm_rms_epsilon",
    "rope.dimension_count",
    "rope.freq_base",
    "vocab_size",
];

/// General (architecture-independent) keys carried forward verbatim.
pub const GENERAL_KEYS: &[&str] = &[
    "general.architecture",
    "general.name",
    "general.quantization_version",
    "general.file_type",
];

/// A typed view of the architecture-shape keys a GGUF file declares, read
/// under `general.architecture`'s namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelArchitectureHint {
    /// `general.architecture`, e.g. `"llama"`.
    pub architecture: Option<String>,
    /// `<arch>.context_length`.
    pub context_length: Option<u32>,
    /// `<arch>.embedding_length`.
    pub embedding_length: Option<u32>,
    /// `<arch>.block_count`.
    pub block_count: Option<u32>,
    /// `<arch>.feed_forward_length`.
    pub feed_forward_length: Option<u32>,
    /// `<arch>.attention.head_count`.
    pub attention_head_count: Option<u32>,
    /// `<arch>.attention.head_count_kv`.
    pub attention_head_count_kv: Option<u32>,
    /// `<arch>.attention.layer_norm_rms_epsilon`.
    pub attention_layer_norm_rms_epsilon: Option<f32>,
    /// `<arch>.rope.dimension_count`.
    pub rope_dimension_count: Option<u32>,
    /// `<arch>.rope.freq_base`.
    pub rope_freq_base: Option<f32>,
    /// `<arch>.vocab_size`.
    pub vocab_size: Option<u32>,
}

impl ModelArchitectureHint {
    /// Reads the allowlisted shape keys under `metadata`'s declared
    /// architecture namespace. Every field is `None` if
    /// `general.architecture` itself is absent.
    pub fn extract(metadata: &MetadataBag) -> Self {
        let architecture = metadata.get_str("general.architecture").map(str::to_string);
        let Some(arch) = &architecture else {
            return Self::default();
        };
        let u32_key = |suffix: &str| metadata.get_u32(&format!("{arch}.{suffix}"));
        let f32_key = |suffix: &str| metadata.get_f32(&format!("{arch}.{suffix}"));
        Self {
            architecture,
            context_length: u32_key("context_length"),
            embedding_length: u32_key("embedding_length"),
            block_count: u32_key("block_count"),
            feed_forward_length: u32_key("feed_forward_length"),
            attention_head_count: u32_key("attention.head_count"),
            attention_head_count_kv: u32_key("attention.head_count_kv"),
            attention_layer_norm_rms_epsilon: f32_key("attention.layer_norm_rms_epsilon"),
            rope_dimension_count: u32_key("rope.dimension_count"),
            rope_freq_base: f32_key("rope.freq_base"),
            vocab_size: u32_key("vocab_size"),
        }
    }
}

/// Whether `key` should be carried forward into the SMQ metadata bag: one
/// of the general keys, one of `architecture`'s allowlisted shape keys, or
/// a `tokenizer.ggml.*` key (\S4.7's tokenizer extraction reads these
/// directly from the destination file too).
pub fn is_allowed_metadata_key(key: &str, architecture: Option<&str>) -> bool {
    if GENERAL_KEYS.contains(&key) || key.starts_with("tokenizer.ggml.") {
        return true;
    }
    if let Some(arch) = architecture {
        let prefix = format!("{arch}.");
        if let Some(suffix) = key.strip_prefix(&prefix) {
            return SHAPE_KEY_SUFFIXES.contains(&suffix);
        }
    }
    false
}
