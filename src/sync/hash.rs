//! Content fingerprints for sync operations.
//!
//! Uses MD5 so local digests compare directly against the ETags S3 reports
//! for single-part uploads.

use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, SyncError};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Render a digest as lowercase hex.
fn to_hex(digest: &[u8]) -> String {
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// Fingerprint of an in-memory buffer.
pub fn fingerprint_bytes(data: &[u8]) -> String {
    to_hex(&Md5::digest(data))
}

/// Fingerprint of a file's full contents, streamed through a fixed buffer.
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|err| SyncError::io(path, err))?;
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|err| SyncError::io(path, err))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(to_hex(&hasher.finalize()))
}

/// Strip the quotes S3 puts around ETags.
pub fn normalize_etag(etag: &str) -> String {
    etag.trim().trim_matches('"').to_string()
}
