//! The vocabulary (token string <-> id) and merge-rank table (\S3's
//! Tokenizer data model).

use std::collections::HashMap;

use crate::error::TokenizerError;

/// An injective `token string -> id` mapping whose inverse is a total
/// function over `0..vocab.len()`.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    token_to_id: HashMap<String, u32>,
    id_to_token: Vec<String>,
}

impl Vocabulary {
    /// Builds a vocabulary from tokens in id order (id = array index, per
    /// \S4.7 step 2).
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self, TokenizerError> {
        if tokens.is_empty() {
            return Err(TokenizerError::ValidationError("empty vocabulary".to_string()));
        }
        let mut token_to_id = HashMap::with_capacity(tokens.len());
        for (id, token) in tokens.iter().enumerate() {
            token_to_id.insert(token.clone(), id as u32);
        }
        Ok(Self {
            token_to_id,
            id_to_token: tokens,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    /// Whether the vocabulary has no entries.
    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// Looks up a token's id.
    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    /// Looks up an id's token string, borrowed (no allocation).
    pub fn token_str(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(id as usize).map(|s| s.as_str())
    }
}

/// An ordered sequence of `(left, right)` merge pairs whose rank is their
/// position, indexed for O(1) rank lookup by the pair's two strings without
/// allocating a lookup key (\S4.6's merge loop needs this on every scanned
/// adjacent pair).
#[derive(Debug, Clone)]
pub struct MergeTable {
    ranks: HashMap<String, HashMap<String, u32>>,
}

impl MergeTable {
    /// Builds the rank table from merges in priority order (earliest =
    /// lowest rank, highest priority).
    pub fn from_merges(merges: Vec<(String, String)>) -> Self {
        let mut ranks: HashMap<String, HashMap<String, u32>> = HashMap::new();
        for (rank, (left, right)) in merges.into_iter().enumerate() {
            ranks.entry(left).or_default().insert(right, rank as u32);
        }
        Self { ranks }
    }

    /// The rank of `(left, right)`, or `None` if it is not a merge pair.
    pub fn rank(&self, left: &str, right: &str) -> Option<u32> {
        self.ranks.get(left)?.get(right).copied()
    }

    /// Number of distinct left-hand sides (not total merge count).
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}
