//! SHA-256 verification of installed binaries.

use furyctl_core::{Error, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::ToolDescriptor;

/// Hex SHA-256 of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|e| Error::io(e, path, "open"))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| Error::io(e, path, "read"))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Verify the tool's installed binary against a `"<os>/<arch>" → sha256` table.
///
/// The entry for the downloaded artifact's platform is preferred; the host
/// platform's entry is used when the table has no artifact entry.
///
/// # Errors
///
/// Returns [`Error::ChecksumEntryMissing`] when the table has no entry for
/// the platform and [`Error::ChecksumMismatch`] when the digest differs.
pub fn validate_checksum(tool: &ToolDescriptor, checksums: &BTreeMap<String, String>) -> Result<()> {
    let artifact_key = tool.artifact_platform().to_string();
    let host_key = tool.platform().to_string();

    let expected = checksums
        .get(&artifact_key)
        .or_else(|| checksums.get(&host_key))
        .ok_or_else(|| Error::ChecksumEntryMissing {
            tool: tool.name().to_string(),
            platform: artifact_key.clone(),
        })?;

    let actual = sha256_file(&tool.binary_path())?;
    debug!(tool = %tool.name(), platform = %artifact_key, "Verifying checksum");

    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch {
            tool: tool.name().to_string(),
            expected: expected.trim().to_lowercase(),
            actual,
        })
    }
}
