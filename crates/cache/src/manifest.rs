//! The cache entry manifest: `<root>/<model_id>/manifest.json` (\S6).
//!
//! A plain struct with `serde`'s derive macros, per \S9's "Reflection /
//! attribute-based JSON ... implement as a plain struct with an explicit
//! serializer. No runtime reflection required" — `serde_json` is exactly
//! that explicit (derive-generated, not reflective) serializer.

use serde::{Deserialize, Serialize};

/// The format a cached model file was inferred to be, from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// `.gguf`
    Gguf,
    /// `.smq`
    Smq,
    /// `.bin`
    Bin,
    /// Any other or missing extension.
    Unknown,
}

impl ModelFormat {
    /// Infers a format from a file's extension (case-insensitive).
    pub fn from_extension(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("gguf") => ModelFormat::Gguf,
            Some("smq") => ModelFormat::Smq,
            Some("bin") => ModelFormat::Bin,
            _ => ModelFormat::Unknown,
        }
    }
}

/// One file tracked by a cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the model's cache directory.
    pub path: String,
    /// Size in bytes, as stored on disk.
    #[serde(rename = "sizeBytes")]
    pub size_bytes: u64,
    /// Lowercase hex-encoded SHA-256 digest of the file's contents.
    pub sha256: String,
}

/// The persisted manifest for one cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// The entry's model id (directory name under the cache root).
    #[serde(rename = "modelId")]
    pub model_id: String,
    /// A human-readable display name.
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Inferred file format.
    pub format: ModelFormat,
    /// Quantization scheme, if known (free-form, e.g. `"Q4_0"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantization: Option<String>,
    /// The id of an associated tokenizer entry, if tracked separately.
    #[serde(rename = "tokenizerId", skip_serializing_if = "Option::is_none")]
    pub tokenizer_id: Option<String>,
    /// Maximum context length, if known.
    #[serde(rename = "maxContextTokens", skip_serializing_if = "Option::is_none")]
    pub max_context_tokens: Option<u32>,
    /// Every file tracked by this entry.
    pub files: Vec<FileEntry>,
    /// ISO-8601 UTC creation timestamp.
    #[serde(rename = "createdUtc")]
    pub created_utc: String,
    /// The original source (local path or URL) `register` was called with.
    pub source: String,
    /// Free-form operator notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Manifest {
    /// The first file's cache-relative path, per \S4.8's `get_file`
    /// contract ("first file of the manifest").
    pub fn primary_file(&self) -> Option<&FileEntry> {
        self.files.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_inferred_from_extension_case_insensitively() {
        assert_eq!(ModelFormat::from_extension(std::path::Path::new("m.GGUF")), ModelFormat::Gguf);
        assert_eq!(ModelFormat::from_extension(std::path::Path::new("m.smq")), ModelFormat::Smq);
        assert_eq!(ModelFormat::from_extension(std::path::Path::new("m.bin")), ModelFormat::Bin);
        assert_eq!(ModelFormat::from_extension(std::path::Path::new("m.weird")), ModelFormat::Unknown);
        assert_eq!(ModelFormat::from_extension(std::path::Path::new("m")), ModelFormat::Unknown);
    }

    #[test]
    fn serializes_with_spec_key_names_and_omits_absent_optionals() {
        let manifest = Manifest {
            model_id: "llama".to_string(),
            display_name: "Llama".to_string(),
            format: ModelFormat::Gguf,
            quantization: None,
            tokenizer_id: None,
            max_context_tokens: None,
            files: vec![FileEntry {
                path: "model.gguf".to_string(),
                size_bytes: 1024,
                sha256: "abc".to_string(),
            }],
            created_utc: "2026-01-01T00:00:00Z".to_string(),
            source: "/tmp/model.gguf".to_string(),
            notes: None,
        };
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["modelId"], "llama");
        assert_eq!(json["createdUtc"], "2026-01-01T00:00:00Z");
        assert_eq!(json["files"][0]["sizeBytes"], 1024);
        assert!(json.get("quantization").is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let manifest = Manifest {
            model_id: "llama".to_string(),
            display_name: "Llama".to_string(),
            format: ModelFormat::Gguf,
            quantization: Some("Q4_0".to_string()),
            tokenizer_id: None,
            max_context_tokens: Some(4096),
            files: vec![],
            created_utc: "2026-01-01T00:00:00Z".to_string(),
            source: "https://example.com/m.gguf".to_string(),
            notes: Some("test".to_string()),
        };
        let json = serde_json::to_string(&manifest).unwrap();
        let back: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
