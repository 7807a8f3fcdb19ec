use std::io::{self, Read};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const REPORT_SCHEMA_VERSION: &str = "v1";

/// Summary of a successful packaging run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageReport {
    pub schema_version: String,
    pub archive_path: String,
    pub archive_bytes: u64,
    pub archive_sha256: String,
    pub runtime: String,
    pub requirements: usize,
    pub dependency_entries: usize,
    pub source_files: Vec<String>,
}

/// Size and lowercase SHA-256 hex digest of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFingerprint {
    pub bytes: u64,
    pub sha256: String,
}

/// Streams `reader` through the hasher without buffering the whole archive.
pub fn fingerprint_reader(mut reader: impl Read) -> io::Result<ArchiveFingerprint> {
    let mut hasher = Sha256::new();
    let bytes = io::copy(&mut reader, &mut hasher)?;
    Ok(ArchiveFingerprint {
        bytes,
        sha256: format!("{:x}", hasher.finalize()),
    })
}

pub fn report_json(report: &PackageReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
