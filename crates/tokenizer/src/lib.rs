//! Byte-pair-encoding tokenizer core: vocabulary, merge table,
//! pre-tokenization, the BPE merge algorithm, and the reversible
//! byte-level mapping (\S4.6), plus a GGUF metadata extractor (\S4.7).
#![deny(missing_docs)]

mod bpe;
mod byte_level;
mod error;
mod extractor;
mod pretokenize;
mod vocab;

pub use error::TokenizerError;
pub use extractor::TokenizerOverrides;
pub use vocab::{MergeTable, Vocabulary};

use std::borrow::Cow;

use byte_level::ByteLevelMap;

/// The four well-known special token roles, each possibly unset (\S3:
/// "special-ids: {bos, eos, unk, pad} possibly absent (-1)" — represented
/// here as `None` rather than carrying the GGUF sentinel through).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecialIds {
    /// Beginning-of-sequence id.
    pub bos: Option<u32>,
    /// End-of-sequence id.
    pub eos: Option<u32>,
    /// Unknown-token id, used by plain BPE when a symbol has no
    /// vocabulary entry.
    pub unk: Option<u32>,
    /// Padding id.
    pub pad: Option<u32>,
}

/// A constructed BPE tokenizer: a vocabulary, a merge-rank table, and the
/// flags that select plain vs. byte-level pre-tokenization and encoding.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: Vocabulary,
    merges: MergeTable,
    byte_level: bool,
    byte_map: ByteLevelMap,
    special: SpecialIds,
    add_bos: bool,
}

impl Tokenizer {
    /// Builds a tokenizer directly from its parts. Most callers instead
    /// use [`Tokenizer::from_gguf_info`] to build one from a GGUF file's
    /// embedded metadata.
    pub fn new(vocab: Vocabulary, merges: MergeTable, byte_level: bool, special: SpecialIds, add_bos: bool) -> Self {
        Self {
            vocab,
            merges,
            byte_level,
            byte_map: ByteLevelMap::new(),
            special,
            add_bos,
        }
    }

    /// Builds a tokenizer from a parsed GGUF file's metadata, per \S4.7.
    /// Returns `Ok(None)` if `tokenizer.ggml.model` is absent or not one
    /// of the recognized values.
    pub fn from_gguf_info(
        info: &smallmind_gguf::ModelInfo,
        overrides: TokenizerOverrides,
    ) -> Result<Option<Self>, TokenizerError> {
        extractor::from_gguf_info(info, overrides)
    }

    /// Total vocabulary size.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Borrows a token's string by id.
    pub fn token_str(&self, id: u32) -> Option<&str> {
        self.vocab.token_str(id)
    }

    /// Whether this tokenizer uses the GPT-2-style byte-level mapping.
    pub fn is_byte_level(&self) -> bool {
        self.byte_level
    }

    /// The tokenizer's special token ids.
    pub fn special_ids(&self) -> SpecialIds {
        self.special
    }

    /// Whether `bos` is prepended to every encoded sequence (\S4.6's BOS
    /// handling).
    pub fn add_bos(&self) -> bool {
        self.add_bos
    }

    /// Encodes `text` into a fresh id vector.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let mut out = Vec::new();
        self.encode_into(text, &mut out)?;
        Ok(out)
    }

    /// Encodes `text`, appending ids to `out`. Returns the number of ids
    /// appended.
    pub fn encode_into(&self, text: &str, out: &mut Vec<u32>) -> Result<usize, TokenizerError> {
        let start_len = out.len();
        let pre_tokens: Vec<&str> = if self.byte_level {
            pretokenize::split_byte_level(text)
        } else {
            pretokenize::split_plain(text)
        };

        for pre in pre_tokens {
            let symbols: Vec<String> = if self.byte_level {
                self.byte_map.encode_bytes(pre.as_bytes()).chars().map(|c| c.to_string()).collect()
            } else {
                pre.chars().map(|c| c.to_string()).collect()
            };
            let merged = bpe::merge(symbols, &self.merges);
            for symbol in merged {
                match self.vocab.token_to_id(&symbol) {
                    Some(id) => out.push(id),
                    None if self.byte_level => {
                        return Err(TokenizerError::FormatError(format!(
                            "byte-level symbol {symbol:?} missing from vocabulary"
                        )));
                    }
                    None => {
                        if let Some(unk) = self.special.unk {
                            out.push(unk);
                        } else {
                            return Err(TokenizerError::UnknownToken(symbol));
                        }
                    }
                }
            }
        }

        if self.add_bos {
            if let Some(bos) = self.special.bos {
                if out.get(start_len) != Some(&bos) {
                    out.insert(start_len, bos);
                }
            }
        }
        Ok(out.len() - start_len)
    }

    /// Fast path for already-UTF-8 byte input; appends ids to `out`.
    pub fn encode_utf8(&self, bytes: &[u8], out: &mut Vec<u32>) -> Result<usize, TokenizerError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| TokenizerError::FormatError("input bytes are not valid UTF-8".to_string()))?;
        self.encode_into(text, out)
    }

    /// Decodes `ids` back into text, skipping a leading `bos` if present.
    pub fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        let mut bytes = Vec::new();
        self.decode_into(ids, &mut bytes)?;
        String::from_utf8(bytes)
            .map_err(|_| TokenizerError::FormatError("decoded bytes are not valid UTF-8".to_string()))
    }

    /// Decodes `ids`, appending raw UTF-8 bytes to `out_bytes`. Returns the
    /// number of bytes appended.
    pub fn decode_into(&self, ids: &[u32], out_bytes: &mut Vec<u8>) -> Result<usize, TokenizerError> {
        let start_len = out_bytes.len();
        let ids = match (self.special.bos, ids.first()) {
            (Some(bos), Some(&first)) if first == bos => &ids[1..],
            _ => ids,
        };

        for &id in ids {
            let token = self
                .vocab
                .token_str(id)
                .ok_or_else(|| TokenizerError::FormatError(format!("no such token id {id}")))?;
            if self.byte_level {
                for ch in token.chars() {
                    let byte = self
                        .byte_map
                        .char_to_byte(ch)
                        .ok_or_else(|| TokenizerError::FormatError(format!("symbol {ch:?} has no byte mapping")))?;
                    out_bytes.push(byte);
                }
            } else {
                out_bytes.extend_from_slice(token.as_bytes());
            }
        }
        Ok(out_bytes.len() - start_len)
    }

    /// Decodes a single id without allocation when this tokenizer is not
    /// byte-level (the borrowed vocabulary string is returned directly);
    /// byte-level tokenizers must allocate to undo the byte remapping.
    pub fn decode_single(&self, id: u32) -> Result<Cow<'_, str>, TokenizerError> {
        if !self.byte_level {
            let token = self
                .vocab
                .token_str(id)
                .ok_or_else(|| TokenizerError::FormatError(format!("no such token id {id}")))?;
            return Ok(Cow::Borrowed(token));
        }
        Ok(Cow::Owned(self.decode(&[id])?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_tokenizer() -> Tokenizer {
        // S4: vocab {"h":0,"e":1,"l":2,"o":3,"he":4,"ll":5,"hell":6},
        // merges [(h,e),(l,l),(he,ll)].
        let vocab = Vocabulary::from_tokens(vec![
            "h".into(),
            "e".into(),
            "l".into(),
            "o".into(),
            "he".into(),
            "ll".into(),
            "hell".into(),
        ])
        .unwrap();
        let merges = MergeTable::from_merges(vec![
            ("h".into(), "e".into()),
            ("l".into(), "l".into()),
            ("he".into(), "ll".into()),
        ]);
        Tokenizer::new(vocab, merges, false, SpecialIds::default(), false)
    }

    #[test]
    fn s4_bpe_merges_produce_hell_o() {
        let tok = plain_tokenizer();
        let ids = tok.encode("hello").unwrap();
        assert_eq!(ids, vec![6, 3]);
        assert_eq!(tok.decode(&ids).unwrap(), "hello");
    }

    #[test]
    fn unknown_symbol_without_unk_errors() {
        let tok = plain_tokenizer();
        assert!(tok.encode("hellox").is_err());
    }

    #[test]
    fn unknown_symbol_falls_back_to_unk_when_configured() {
        let vocab = Vocabulary::from_tokens(vec!["h".into(), "e".into(), "<unk>".into()]).unwrap();
        let merges = MergeTable::from_merges(Vec::new());
        let special = SpecialIds {
            unk: Some(2),
            ..Default::default()
        };
        let tok = Tokenizer::new(vocab, merges, false, special, false);
        let ids = tok.encode("hex").unwrap();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn bos_is_prepended_once() {
        let vocab = Vocabulary::from_tokens(vec!["<s>".into(), "a".into()]).unwrap();
        let merges = MergeTable::from_merges(Vec::new());
        let special = SpecialIds {
            bos: Some(0),
            ..Default::default()
        };
        let tok = Tokenizer::new(vocab, merges, false, special, true);
        let ids = tok.encode("a").unwrap();
        assert_eq!(ids, vec![0, 1]);
    }

    proptest::proptest! {
        #[test]
        fn s5_byte_level_round_trip(s in ".*") {
            // Minimal byte-level vocabulary: one symbol per possible byte
            // mapping plus enough merges to be a no-op (empty merge table
            // keeps every byte as its own token, which is always a valid
            // byte-level encoding).
            let byte_map = ByteLevelMap::new();
            let mut tokens: Vec<String> = (0u16..=255).map(|b| byte_map.byte_to_char(b as u8).to_string()).collect();
            tokens.sort();
            tokens.dedup();
            let vocab = Vocabulary::from_tokens(tokens).unwrap();
            let merges = MergeTable::from_merges(Vec::new());
            let tok = Tokenizer::new(vocab, merges, true, SpecialIds::default(), false);

            let ids = tok.encode(&s).unwrap();
            let back = tok.decode(&ids).unwrap();
            proptest::prop_assert_eq!(back, s);
        }
    }
}
