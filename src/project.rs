//! One install/update/check/clean pass over a root document

use crate::core::{CwldepError, CwldepResult};
use crate::di::ServiceContainer;
use crate::lock::{LockManager, Lockfile};
use crate::resolver::{DependencyResolver, EntryError, Operation, ResolutionRun};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Exit status for a run that finished cleanly
pub const EXIT_OK: u8 = 0;
/// Exit status when any entry or the run itself failed
pub const EXIT_FAILURE: u8 = 1;
/// Exit status for a check that found work for install or update
pub const EXIT_OUTSTANDING: u8 = 2;

/// Everything a sync found and did
#[derive(Debug)]
pub struct SyncReport {
    pub operation: Operation,
    pub errors: Vec<EntryError>,
    pub needs_install: Vec<String>,
    pub changed: Vec<String>,
    /// Orphans deleted by `clean`
    pub removed: Vec<String>,
    /// Orphans kept in the lockfile
    pub unreferenced: Vec<String>,
    pub failed_removals: Vec<(String, String)>,
    /// The reconciled lockfile (written unless the run was a check)
    pub lockfile: Lockfile,
    pub lockfile_path: PathBuf,
    pub lockfile_written: bool,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.failed_removals.is_empty()
    }

    pub fn exit_code(&self) -> u8 {
        if !self.is_success() {
            EXIT_FAILURE
        } else if self.operation.is_check()
            && (!self.needs_install.is_empty() || !self.changed.is_empty())
        {
            EXIT_OUTSTANDING
        } else {
            EXIT_OK
        }
    }
}

/// A workflow document and the directory its dependencies install under
pub struct Project {
    root: PathBuf,
    document: PathBuf,
}

impl Project {
    pub fn new(root: PathBuf, document: PathBuf) -> Self {
        Self { root, document }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    pub fn lock_manager(&self) -> LockManager {
        LockManager::for_document(self.root.clone(), &self.document)
    }

    /// Resolve every `Dependencies` hint of the document and reconcile the
    /// lockfile
    ///
    /// Entry failures are collected in the report; only problems with the
    /// document or lockfile themselves return an error.
    pub async fn sync(
        &self,
        container: &ServiceContainer,
        operation: Operation,
    ) -> CwldepResult<SyncReport> {
        let lock = self.lock_manager();
        let prior = lock.load()?;

        let location = self.document.to_str().ok_or_else(|| {
            CwldepError::Path(format!("Non UTF-8 path: {}", self.document.display()))
        })?;
        let document = container.loader.load(location).await?;
        let trees = container.loader.dependencies(&document)?;

        let resolver = DependencyResolver::new(container, self.root.clone())?;
        let mut run = ResolutionRun::new(prior, operation);
        for tree in &trees {
            resolver.resolve(&self.root, tree, &mut run).await;
        }

        // an entry that failed this run may still be declared
        let reconcile_as = if operation == Operation::Clean && run.has_errors() {
            warn!("Errors during clean, unreferenced dependencies were not removed");
            Operation::Install
        } else {
            operation
        };
        let reconciliation = lock.reconcile(&run.prior, run.verified, reconcile_as);

        let lockfile_written = !operation.is_check();
        if lockfile_written {
            lock.persist(&reconciliation.lockfile)?;
        } else {
            info!("Check only, {} left unchanged", lock.lockfile_path().display());
        }

        Ok(SyncReport {
            operation,
            errors: run.errors,
            needs_install: run.needs_install,
            changed: run.changed,
            removed: reconciliation.removed,
            unreferenced: reconciliation.unreferenced,
            failed_removals: reconciliation.failed,
            lockfile: reconciliation.lockfile,
            lockfile_path: lock.lockfile_path().to_path_buf(),
            lockfile_written,
        })
    }
}
