//! Content digests used to recognise a source that was already copied into place.

use crate::{io_context, FilesError};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Computes the hex SHA-256 digest of a file, streaming it in fixed-size chunks.
pub fn file_digest(path: &Path) -> Result<String, FilesError> {
    let mut file = fs::File::open(path).map_err(|e| io_context("open", path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_BYTES];

    loop {
        let read = file
            .read(&mut buffer)
            .map_err(|e| io_context("read", path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Returns true if both files have the same length and the same SHA-256 digest.
///
/// Lengths are compared first so differing files are usually rejected without hashing.
pub fn same_content(a: &Path, b: &Path) -> Result<bool, FilesError> {
    let len_a = fs::metadata(a).map_err(|e| io_context("stat", a, e))?.len();
    let len_b = fs::metadata(b).map_err(|e| io_context("stat", b, e))?.len();
    if len_a != len_b {
        return Ok(false);
    }

    Ok(file_digest(a)? == file_digest(b)?)
}
