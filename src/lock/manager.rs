use super::lockfile::{Lockfile, VerifiedSet};
use crate::core::path::{lockfile_path, resolve_key};
use crate::core::CwldepResult;
use crate::resolver::Operation;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of reconciling a run against the prior lockfile
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// The lockfile to persist
    pub lockfile: Lockfile,
    /// Orphaned entries dropped by `clean`
    pub removed: Vec<String>,
    /// Orphaned entries carried forward (every operation but `clean`)
    pub unreferenced: Vec<String>,
    /// Orphaned entries `clean` could not fully delete; kept in the lockfile
    pub failed: Vec<(String, String)>,
}

/// Loads, reconciles, and persists the lockfile of one document
pub struct LockManager {
    project_root: PathBuf,
    lockfile_path: PathBuf,
}

impl LockManager {
    pub fn new(project_root: PathBuf, lockfile_path: PathBuf) -> Self {
        Self {
            project_root,
            lockfile_path,
        }
    }

    /// Manager for `<document>.dep.lock`
    pub fn for_document(project_root: PathBuf, document: &Path) -> Self {
        Self::new(project_root, lockfile_path(document))
    }

    pub fn lockfile_path(&self) -> &Path {
        &self.lockfile_path
    }

    /// Load the prior lockfile (empty when none exists yet)
    pub fn load(&self) -> CwldepResult<Lockfile> {
        Lockfile::load(&self.lockfile_path)
    }

    /// Merge the run's verified set with the prior lockfile
    ///
    /// Prior entries the run did not reach are orphans. `clean` deletes their
    /// installed paths and drops them; every other operation keeps them.
    pub fn reconcile(
        &self,
        prior: &Lockfile,
        verified: VerifiedSet,
        operation: Operation,
    ) -> Reconciliation {
        let mut result = Reconciliation {
            lockfile: verified,
            ..Default::default()
        };

        for (key, entry) in prior.iter() {
            if result.lockfile.contains(key) {
                continue;
            }

            if operation == Operation::Clean {
                match self.remove_installed(&entry.installed_to) {
                    Ok(()) => result.removed.push(key.clone()),
                    Err(e) => {
                        warn!("Failed to remove {}: {}", key, e);
                        result.failed.push((key.clone(), e.to_string()));
                        result.lockfile.insert(key.clone(), entry.clone());
                    }
                }
            } else {
                warn!("In lockfile but not referenced: {}", key);
                result.unreferenced.push(key.clone());
                result.lockfile.insert(key.clone(), entry.clone());
            }
        }

        if !result.unreferenced.is_empty() {
            warn!("Use 'cwldep clean' to delete unused dependencies.");
        }

        result
    }

    /// Write the lockfile next to its document
    pub fn persist(&self, lockfile: &Lockfile) -> CwldepResult<()> {
        lockfile.save(&self.lockfile_path)?;
        info!("Wrote {}", self.lockfile_path.display());
        Ok(())
    }

    fn remove_installed(&self, installed_to: &[String]) -> CwldepResult<()> {
        for key in installed_to {
            let path = resolve_key(key, &self.project_root);
            let metadata = match fs::symlink_metadata(&path) {
                Ok(m) => m,
                Err(_) => continue,
            };
            warn!("Removing {}", key);
            if metadata.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}
