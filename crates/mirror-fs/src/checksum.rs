//! SHA-256 content digests
//!
//! Provides a single canonical checksum format (`sha256:<hex>`) used by the
//! mirror engine to decide whether a replica file differs from its source.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{Error, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Size of the buffer files are streamed through while hashing.
pub const CHUNK_SIZE: usize = 4096;

/// Compute the SHA-256 checksum of in-memory content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_content_checksum(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
///
/// The file is read in [`CHUNK_SIZE`] chunks, so memory use does not depend
/// on file size. The result is identical to [`compute_content_checksum`]
/// over the same bytes.
///
/// # Errors
///
/// Returns [`Error::Read`] if the file cannot be opened or read fully.
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::read(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::read(path, e)),
        };
        hasher.update(&buf[..n]);
    }

    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}
