use crate::core::{CwldepError, CwldepResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read size used when hashing files and download streams
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Checksum algorithm for verifying artifact integrity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumAlgorithm {
    /// SHA-256
    Sha256,
    /// BLAKE3 (default)
    #[default]
    Blake3,
}

impl ChecksumAlgorithm {
    /// Parse algorithm from a prefixed checksum string
    pub fn from_checksum(checksum: &str) -> Self {
        if checksum.starts_with("sha256:") {
            ChecksumAlgorithm::Sha256
        } else {
            // Unprefixed checksums are treated as BLAKE3
            ChecksumAlgorithm::Blake3
        }
    }

    /// Parse a configured algorithm name
    pub fn parse(name: &str) -> CwldepResult<Self> {
        match name {
            "blake3" => Ok(ChecksumAlgorithm::Blake3),
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            other => Err(CwldepError::Config(format!(
                "Unknown checksum algorithm '{}' (expected blake3 or sha256)",
                other
            ))),
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Blake3 => "blake3",
        }
    }

    pub fn hasher(&self) -> StreamingHasher {
        match self {
            ChecksumAlgorithm::Sha256 => StreamingHasher::Sha256(Sha256::new()),
            ChecksumAlgorithm::Blake3 => StreamingHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }
}

/// Incremental hasher fed chunk by chunk
pub enum StreamingHasher {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl StreamingHasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            StreamingHasher::Sha256(h) => h.update(data),
            StreamingHasher::Blake3(h) => {
                h.update(data);
            }
        }
    }

    /// Prefixed hex digest (`blake3:...`, `sha256:...`)
    pub fn finish(self) -> String {
        match self {
            StreamingHasher::Sha256(h) => format!("sha256:{}", hex::encode(h.finalize())),
            StreamingHasher::Blake3(h) => format!("blake3:{}", h.finalize().to_hex()),
        }
    }
}

/// Hash a file in fixed-size chunks
pub fn file_checksum(path: &Path, algorithm: ChecksumAlgorithm) -> CwldepResult<String> {
    let mut file = File::open(path)?;
    let mut hasher = algorithm.hasher();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}

/// Compare two checksums, ignoring a missing prefix on either side
pub fn checksums_match(expected: &str, actual: &str) -> bool {
    let expected_hash = expected.split_once(':').map(|(_, h)| h).unwrap_or(expected);
    let actual_hash = actual.split_once(':').map(|(_, h)| h).unwrap_or(actual);
    expected_hash.eq_ignore_ascii_case(actual_hash)
}
