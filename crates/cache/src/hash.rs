//! SHA-256 file hashing (\S4.8, \S9's "SHA-256 must be the sole integrity
//! invariant").

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Hashes `path`'s contents, streaming in fixed-size chunks so arbitrarily
/// large model files never require loading whole into memory.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_lower(&hasher.finalize()))
}

fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s6_hashes_a_1kib_file_of_0x5a_bytes_to_the_canonical_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.bin");
        std::fs::write(&path, vec![0x5Au8; 1024]).unwrap();
        let digest = sha256_file(&path).unwrap();
        assert_eq!(digest, "e8fb68ce4d4d002dba40c0a459d96807c96ded1c2fdefae3f56f8a0c06a4fecf");
    }

    #[test]
    fn flipping_one_byte_changes_the_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.bin");
        let mut bytes = vec![0x5Au8; 1024];
        bytes[1023] = 0x5B;
        std::fs::write(&path, &bytes).unwrap();
        let digest = sha256_file(&path).unwrap();
        assert_eq!(digest, "75744075bfac9275499309ea69095e6c45858975d6d8c550d86bb4d3599f37fd");
    }
}
