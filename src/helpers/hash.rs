//! SHA-256 hashing and verification
//!
//! Files are hashed in chunks; large files get a progress bar.

use crate::core::error::{FormulaError, Result};
use crate::core::output;
use crate::formula::Checksum;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Threshold for showing progress (100MB)
const PROGRESS_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Compute the lowercase hex sha256 of a file.
pub fn sha256_file(file: &Path) -> Result<String> {
    let mut f = std::fs::File::open(file)?;
    let file_size = f.metadata().map(|m| m.len()).unwrap_or(0);
    let pb = (file_size > PROGRESS_THRESHOLD).then(|| {
        let pb = output::spinner("checksum");
        output::upgrade_to_bytes(&pb, file_size);
        pb
    });

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total_read = 0u64;
    loop {
        let n = f.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        total_read += n as u64;
        if let Some(pb) = &pb {
            pb.set_position(total_read);
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Verify that `file` matches `expected`, naming the resource `name` on failure.
pub fn verify_file(file: &Path, name: &str, expected: &Checksum) -> Result<()> {
    let actual = sha256_file(file)?;
    if !expected.matches(&actual) {
        return Err(FormulaError::Integrity {
            name: name.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
