use super::checksum::{checksums_match, file_checksum, ChecksumAlgorithm};
use crate::core::path::{relative_key, resolve_key};
use crate::core::{CwldepError, CwldepResult};
use crate::lock::{LockEntry, Lockfile, VerifiedSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Verifies installed artifacts against their lock entries
///
/// Verification only reads: it never creates, moves, or removes files.
pub struct Verifier {
    project_root: PathBuf,
}

impl Verifier {
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    /// Check `target` against its prior lock entry
    ///
    /// Returns true iff `target` is a file, `prior` holds a checksummed entry
    /// for it, and the content still hashes to that checksum. On success the
    /// prior entry is carried into `verified` unchanged.
    pub fn verify(&self, target: &Path, prior: &Lockfile, verified: &mut VerifiedSet) -> bool {
        let key = relative_key(target, &self.project_root);
        let Some(entry) = prior.get(&key) else {
            return false;
        };
        if !target.is_file() {
            return false;
        }
        match self.verify_entry(&key, entry) {
            Ok(()) => {
                debug!("Verified {}", key);
                verified.insert(key, entry.clone());
                true
            }
            Err(e) => {
                debug!("{} not verified: {}", key, e);
                false
            }
        }
    }

    /// Verify every checksummed entry of a lockfile
    pub fn verify_all(&self, lockfile: &Lockfile) -> VerificationResult {
        let mut result = VerificationResult::new();

        for (key, entry) in lockfile.iter() {
            if entry.checksum.is_none() {
                continue;
            }
            match self.verify_entry(key, entry) {
                Ok(()) => result.add_success(key.clone()),
                Err(e) => result.add_failure(key.clone(), e.to_string()),
            }
        }

        result
    }

    fn verify_entry(&self, key: &str, entry: &LockEntry) -> CwldepResult<()> {
        let expected = entry
            .checksum
            .as_deref()
            .ok_or_else(|| CwldepError::Document(format!("No checksum recorded for '{}'", key)))?;

        let path = resolve_key(key, &self.project_root);
        if !path.is_file() {
            return Err(CwldepError::Path(format!(
                "File not found for '{}': {}",
                key,
                path.display()
            )));
        }

        let actual = file_checksum(&path, ChecksumAlgorithm::from_checksum(expected))?;
        if !checksums_match(expected, &actual) {
            return Err(CwldepError::Document(format!(
                "Checksum mismatch for '{}':\n  Expected: {}\n  Actual:   {}",
                key, expected, actual
            )));
        }

        Ok(())
    }
}

/// Result of verifying a whole lockfile
#[derive(Debug, Clone, Default)]
pub struct VerificationResult {
    pub successful: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl VerificationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, key: String) {
        self.successful.push(key);
    }

    pub fn add_failure(&mut self, key: String, error: String) {
        self.failed.push((key, error));
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_verified(&self) -> usize {
        self.successful.len() + self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn locked(root: &Path, key: &str, content: &[u8], algorithm: ChecksumAlgorithm) -> Lockfile {
        let path = root.join(key);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        let checksum = file_checksum(&path, algorithm).unwrap();

        let mut lock = Lockfile::new();
        lock.insert(
            key.to_string(),
            LockEntry::new("https://example.com/a.cwl", "", Some(checksum), vec![key.to_string()]),
        );
        lock
    }

    #[test]
    fn test_verify_success_carries_entry_forward() {
        let temp = TempDir::new().unwrap();
        let prior = locked(temp.path(), "example.com/a.cwl", b"class: Workflow", ChecksumAlgorithm::Blake3);
        let verifier = Verifier::new(temp.path().to_path_buf());

        let mut verified = Lockfile::new();
        assert!(verifier.verify(&temp.path().join("example.com/a.cwl"), &prior, &mut verified));
        assert_eq!(verified.get("example.com/a.cwl"), prior.get("example.com/a.cwl"));
    }

    #[test]
    fn test_verify_uses_stored_algorithm() {
        let temp = TempDir::new().unwrap();
        let prior = locked(temp.path(), "a.cwl", b"x", ChecksumAlgorithm::Sha256);
        let verifier = Verifier::new(temp.path().to_path_buf());

        let mut verified = Lockfile::new();
        assert!(verifier.verify(&temp.path().join("a.cwl"), &prior, &mut verified));
    }

    #[test]
    fn test_verify_modified_file() {
        let temp = TempDir::new().unwrap();
        let prior = locked(temp.path(), "a.cwl", b"original", ChecksumAlgorithm::Blake3);
        fs::write(temp.path().join("a.cwl"), b"tampered").unwrap();
        let verifier = Verifier::new(temp.path().to_path_buf());

        let mut verified = Lockfile::new();
        assert!(!verifier.verify(&temp.path().join("a.cwl"), &prior, &mut verified));
        assert!(verified.is_empty());
    }

    #[test]
    fn test_verify_unknown_or_missing() {
        let temp = TempDir::new().unwrap();
        let prior = locked(temp.path(), "a.cwl", b"x", ChecksumAlgorithm::Blake3);
        let verifier = Verifier::new(temp.path().to_path_buf());
        let mut verified = Lockfile::new();

        fs::write(temp.path().join("b.cwl"), b"x").unwrap();
        assert!(!verifier.verify(&temp.path().join("b.cwl"), &prior, &mut verified));

        fs::remove_file(temp.path().join("a.cwl")).unwrap();
        assert!(!verifier.verify(&temp.path().join("a.cwl"), &prior, &mut verified));
    }

    #[test]
    fn test_verify_entry_without_checksum() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("repo"), b"x").unwrap();
        let mut prior = Lockfile::new();
        prior.insert(
            "repo".to_string(),
            LockEntry::new("https://example.com/repo", "abc", None, vec!["repo".to_string()]),
        );

        let verifier = Verifier::new(temp.path().to_path_buf());
        let mut verified = Lockfile::new();
        assert!(!verifier.verify(&temp.path().join("repo"), &prior, &mut verified));
    }

    #[test]
    fn test_verify_all() {
        let temp = TempDir::new().unwrap();
        let mut lock = locked(temp.path(), "a.cwl", b"a", ChecksumAlgorithm::Blake3);
        let other = locked(temp.path(), "b.cwl", b"b", ChecksumAlgorithm::Blake3);
        lock.insert("b.cwl".to_string(), other.get("b.cwl").unwrap().clone());
        lock.insert(
            "repo".to_string(),
            LockEntry::new("https://example.com/repo", "abc", None, vec!["repo".to_string()]),
        );
        fs::write(temp.path().join("b.cwl"), b"changed").unwrap();

        let result = Verifier::new(temp.path().to_path_buf()).verify_all(&lock);
        assert_eq!(result.successful, vec!["a.cwl".to_string()]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.total_verified(), 2);
        assert!(!result.is_success());
    }
}
