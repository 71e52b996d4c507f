use crate::error::IngestError;
use log::debug;
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Streams the file through MD5 and compares against `expected`, ignoring case.
pub fn verify_md5(file_path: &Path, expected: &str) -> Result<(), IngestError> {
    debug!("[Checksum] Verifying file: {:?} against {}", file_path, expected);

    let actual = calculate_md5(file_path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        debug!(
            "[Checksum] File: {:?}, Expected: {}, Actual: {}, Result: mismatch",
            file_path, expected, actual
        );
        return Err(IngestError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

pub fn calculate_md5(file_path: &Path) -> Result<String, IngestError> {
    debug!("[Checksum] Calculating MD5 for file: {:?}", file_path);
    let file = File::open(file_path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    let hash = format!("{:x}", hasher.finalize());
    debug!("[Checksum] MD5 result for file {:?}: {}", file_path, hash);
    Ok(hash)
}
