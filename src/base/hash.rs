//! SHA-256 content hashes, hex encoded.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Hex SHA-256 of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hex SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(sha256_bytes(&data))
}

/// Hash of a file list: SHA-256 over the concatenation of each file's hex
/// SHA-256, in the given order.
pub fn sha256_files<P: AsRef<Path>>(paths: &[P]) -> Result<String> {
    let mut hasher = Sha256::new();
    for path in paths {
        hasher.update(sha256_file(path.as_ref())?.as_bytes());
    }
    Ok(hex::encode(hasher.finalize()))
}
