//! SHA-256 content digests for pass verification.
//!
//! Only compiled with the `hash-verify` feature. When absent, the verifier
//! uses block-wise byte comparison exclusively.

use crate::types::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 32-byte digest of an in-memory byte sequence.
pub fn digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// 32-byte digest of a file's contents, read block-by-block.
pub fn digest_file(path: &Path, block: usize) -> Result<[u8; 32]> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; block];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn digest_matches_known_vector() {
        // SHA-256 of the empty string.
        let empty = digest(b"");
        assert_eq!(
            empty[..4],
            [0xe3, 0xb0, 0xc4, 0x42],
            "unexpected SHA-256 prefix for empty input"
        );
    }

    #[test]
    fn file_digest_equals_buffer_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashme");
        let data = vec![0xA5u8; 10_000];
        File::create(&path).unwrap().write_all(&data).unwrap();
        assert_eq!(digest_file(&path, 4096).unwrap(), digest(&data));
    }

    #[test]
    fn file_digest_respects_partial_final_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd");
        let data = vec![0x11u8; 4097];
        File::create(&path).unwrap().write_all(&data).unwrap();
        assert_eq!(digest_file(&path, 4096).unwrap(), digest(&data));
    }
}
