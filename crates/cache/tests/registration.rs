//! Integration tests for the model cache's public surface, mirroring the
//! teacher's `crates/llm/tests/smoke_test.rs` style of driving the crate
//! end-to-end against a scratch directory instead of a mocked backend.

use proptest::prelude::*;
use smallmind_cache::{CacheConfig, ModelCache};

fn cache_in(dir: &std::path::Path) -> ModelCache {
    ModelCache::new(CacheConfig::new(dir.to_path_buf()))
}

#[test]
fn s6_register_then_verify_then_tamper_then_verify_fails() {
    let root = tempfile::tempdir().unwrap();
    let source_dir = tempfile::tempdir().unwrap();
    let source = source_dir.path().join("weights.gguf");
    std::fs::write(&source, vec![0x5Au8; 1024]).unwrap();

    let cache = cache_in(root.path());
    let id = cache
        .register(source.to_str().unwrap(), Some("weights"), Some("Weights"))
        .unwrap();

    let report = cache.verify(&id).unwrap();
    assert!(report.valid, "freshly registered entry should verify clean");

    let stored = cache.get_file(&id).unwrap();
    let mut bytes = std::fs::read(&stored).unwrap();
    let last = bytes.len() - 1;
    bytes[last] = 0x5B;
    std::fs::write(&stored, bytes).unwrap();

    let tampered = cache.verify(&id).unwrap();
    assert!(!tampered.valid, "a single flipped byte must be detected");
    assert_eq!(tampered.errors.len(), 1);
    assert!(tampered.errors[0].contains("sha256 mismatch"));
}

#[test]
fn registering_the_same_model_id_twice_de_conflicts_and_lists_both() {
    let root = tempfile::tempdir().unwrap();
    let source_dir = tempfile::tempdir().unwrap();
    let source = source_dir.path().join("model.gguf");
    std::fs::write(&source, b"v1").unwrap();

    let cache = cache_in(root.path());
    let first = cache.register(source.to_str().unwrap(), Some("dup"), None).unwrap();
    let second = cache.register(source.to_str().unwrap(), Some("dup"), None).unwrap();

    assert_ne!(first, second);
    let ids: Vec<String> = cache.list().into_iter().map(|m| m.model_id).collect();
    assert!(ids.contains(&first));
    assert!(ids.contains(&second));
}

#[test]
fn verify_on_an_entry_with_no_cache_root_yet_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let cache = cache_in(root.path());
    let result = cache.verify("never-registered");
    assert!(matches!(result, Err(smallmind_cache::CacheError::NotFound(_))));
}

proptest! {
    /// Any source-path stem that sanitizes to something non-empty round-trips
    /// through `register` as a valid, filesystem-safe model id prefix.
    #[test]
    fn arbitrary_stems_register_without_panicking(
        stem in "[a-zA-Z0-9 ._-]{1,24}",
    ) {
        let root = tempfile::tempdir().unwrap();
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join(format!("{stem}.gguf"));
        std::fs::write(&source, b"bytes").unwrap();

        let cache = cache_in(root.path());
        let result = cache.register(source.to_str().unwrap(), None, None);
        prop_assert!(result.is_ok());
        let id = result.unwrap();
        prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }
}
