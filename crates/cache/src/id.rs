//! Model-id sanitization and de-confliction (\S4.8 `register`, property 9).

use std::path::Path;

/// Strips every character outside `[A-Za-z0-9_-]` from `raw`, per \S4.8's
/// "retaining only `[A-Za-z0-9_-]`".
pub fn sanitize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-').collect()
}

/// Derives a candidate id from a source path/URL's file stem, sanitized.
pub fn id_from_source(source: &str) -> String {
    let stem = source
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source)
        .split('.')
        .next()
        .unwrap_or(source);
    let sanitized = sanitize(stem);
    if sanitized.is_empty() {
        "model".to_string()
    } else {
        sanitized
    }
}

/// Finds a directory name under `root` that doesn't yet exist, starting
/// from `candidate` and appending `-1`, `-2`, … (\S4.8: "de-conflicting by
/// appending `-1`, `-2`, … until the directory is free").
///
/// Callers must still create the directory exclusively (`create_new`) to
/// close the TOCTOU race this function alone cannot close under
/// concurrent registration (\S5's "tolerate races ... retry on conflict").
pub fn first_free_id(root: &Path, candidate: &str) -> String {
    if !root.join(candidate).exists() {
        return candidate.to_string();
    }
    for suffix in 1u64.. {
        let attempt = format!("{candidate}-{suffix}");
        if !root.join(&attempt).exists() {
            return attempt;
        }
    }
    unreachable!("u64 suffix space exhausted")
}
