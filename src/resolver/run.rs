//! State shared by one resolution pass

use crate::core::{CwldepError, CwldepResult};
use crate::lock::{Lockfile, VerifiedSet};
use std::fmt;
use std::str::FromStr;
use tracing::error;

/// What a run does with the dependency tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    /// Fetch what is missing or no longer matches the lockfile
    #[default]
    Install,
    /// Refetch everything and move repositories to their declared versions
    Update,
    /// Report what install would do without touching the filesystem
    Check,
    /// Install, then delete whatever the lockfile no longer references
    Clean,
}

impl Operation {
    pub fn is_check(&self) -> bool {
        *self == Operation::Check
    }

    /// Whether artifacts that verify against the lockfile are still
    /// compared with upstream
    pub fn refetches_current(&self) -> bool {
        matches!(self, Operation::Update | Operation::Check)
    }
}

impl FromStr for Operation {
    type Err = CwldepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "install" => Ok(Operation::Install),
            "update" => Ok(Operation::Update),
            "check" => Ok(Operation::Check),
            "clean" => Ok(Operation::Clean),
            other => Err(CwldepError::Config(format!(
                "Unknown operation '{}'. Must be install, update, check or clean",
                other
            ))),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Install => "install",
            Operation::Update => "update",
            Operation::Check => "check",
            Operation::Clean => "clean",
        };
        f.write_str(name)
    }
}

/// A dependency entry that failed; its siblings carried on
#[derive(Debug)]
pub struct EntryError {
    pub upstream: String,
    pub error: CwldepError,
}

/// Accumulator owned by a single resolution pass
#[derive(Debug)]
pub struct ResolutionRun {
    pub prior: Lockfile,
    pub operation: Operation,
    pub verified: VerifiedSet,
    pub errors: Vec<EntryError>,
    /// Lock keys a check found missing
    pub needs_install: Vec<String>,
    /// Lock keys whose upstream no longer matches the lockfile
    pub changed: Vec<String>,
    // descriptors on the current recursion path
    ancestors: Vec<String>,
}

impl ResolutionRun {
    pub fn new(prior: Lockfile, operation: Operation) -> Self {
        Self {
            prior,
            operation,
            verified: VerifiedSet::new(),
            errors: Vec::new(),
            needs_install: Vec::new(),
            changed: Vec::new(),
            ancestors: Vec::new(),
        }
    }

    /// Push `upstream` onto the recursion path, failing if it is already there
    pub fn enter(&mut self, upstream: &str) -> CwldepResult<()> {
        if self.ancestors.iter().any(|a| a == upstream) {
            let cycle = self
                .ancestors
                .iter()
                .skip_while(|a| *a != upstream)
                .map(String::as_str)
                .chain(std::iter::once(upstream))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(CwldepError::DependencyCycle(cycle));
        }
        self.ancestors.push(upstream.to_string());
        Ok(())
    }

    pub fn leave(&mut self, upstream: &str) {
        if let Some(pos) = self.ancestors.iter().rposition(|a| a == upstream) {
            self.ancestors.truncate(pos);
        }
    }

    pub fn record_error(&mut self, upstream: &str, error: CwldepError) {
        error!("{}: {}", upstream, error);
        self.errors.push(EntryError {
            upstream: upstream.to_string(),
            error,
        });
    }

    pub fn record_needs_install(&mut self, key: String) {
        self.needs_install.push(key);
    }

    pub fn record_changed(&mut self, key: String) {
        self.changed.push(key);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether a check found anything install or update would change
    pub fn has_outstanding_work(&self) -> bool {
        !self.needs_install.is_empty() || !self.changed.is_empty()
    }
}
