//! Error taxonomy for the tokenizer core and GGUF extractor.

/// Errors produced while encoding, decoding, or building a [`crate::Tokenizer`].
#[derive(Debug, thiserror::Error)]
pub enum TokenizerError {
    /// Plain BPE produced a final symbol with no vocabulary entry and no
    /// `unk` id configured. Carries the offending symbol.
    #[error("unknown token {0:?}")]
    UnknownToken(String),
    /// A structural problem with the tokenizer's own data (a byte-level
    /// symbol missing from the byte map, invalid UTF-8 recovered on
    /// decode, an id outside the vocabulary range).
    #[error("tokenizer format error: {0}")]
    FormatError(String),
    /// Invalid caller input: an empty vocabulary, an unrecognized
    /// `tokenizer.ggml.model`, or similar construction-time violations.
    #[error("invalid tokenizer input: {0}")]
    ValidationError(String),
}
