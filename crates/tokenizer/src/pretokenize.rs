//! Pre-tokenization: splitting input text into pre-token strings before BPE
//! runs, so merges never cross a pre-token boundary (\S4.6).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Plain-BPE splitter: word runs, individual non-word/non-whitespace
    /// characters, and whitespace runs.
    static ref PLAIN_PATTERN: Regex = Regex::new(r"\w+|\s+|[^\s\w]").unwrap();

    /// The GPT-2 contractions-aware splitter: common English contractions,
    /// then (optionally space-prefixed) letter runs, number runs,
    /// punctuation runs, and whitespace runs.
    ///
    /// The reference GPT-2 pattern additionally special-cases a trailing
    /// run of whitespace with a negative lookahead (`\s+(?!\S)`) so all but
    /// its last character attach to the *next* pre-token instead of the
    /// run itself. The `regex` crate has no lookaround support, so this
    /// splitter folds that case into the plain `\s+` alternative; this
    /// changes pre-token *boundaries* inside whitespace runs but not the
    /// byte-level round-trip, since decode only depends on the multiset of
    /// mapped symbols being concatenated back in order, not where BPE drew
    /// pre-token lines.
    static ref BYTE_LEVEL_PATTERN: Regex =
        Regex::new(r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+").unwrap();
}

/// Splits `text` into pre-tokens using the Unicode-aware plain-BPE pattern.
pub fn split_plain(text: &str) -> Vec<&str> {
    PLAIN_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Splits `text` into pre-tokens using the GPT-2-style byte-level pattern.
pub fn split_byte_level(text: &str) -> Vec<&str> {
    BYTE_LEVEL_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_splits_words_whitespace_and_punct() {
        let parts = split_plain("hello, world!");
        assert_eq!(parts, vec!["hello", ",", " ", "world", "!"]);
    }

    #[test]
    fn plain_splits_whitespace_runs() {
        let parts = split_plain("a   b");
        assert_eq!(parts, vec!["a", "   ", "b"]);
    }

    #[test]
    fn byte_level_keeps_leading_space_with_word() {
        let parts = split_byte_level("hello world");
        assert_eq!(parts, vec!["hello", " world"]);
    }

    #[test]
    fn byte_level_splits_contractions() {
        let parts = split_byte_level("don't");
        assert_eq!(parts, vec!["don", "'t"]);
    }

    #[test]
    fn byte_level_reconstructs_input_by_concatenation() {
        let text = "Hi there, 2024 is héllo 🌍!";
        let parts = split_byte_level(text);
        assert_eq!(parts.concat(), text);
    }
}
