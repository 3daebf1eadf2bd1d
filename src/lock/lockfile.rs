use crate::core::{CwldepError, CwldepResult};
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A resolved, installed dependency
///
/// Fields are declared in alphabetical order, which is also their
/// serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    /// Prefixed content hash (`blake3:...`); absent for repositories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Lock keys of everything this entry put on disk
    #[serde(default)]
    pub installed_to: Vec<String>,
    pub retrieved_at: DateTime<FixedOffset>,
    pub upstream: String,
    /// Declared version, or the resolved commit for repositories
    #[serde(default)]
    pub version: String,
}

impl LockEntry {
    /// Entry for a freshly retrieved artifact, stamped with the local time
    pub fn new(
        upstream: impl Into<String>,
        version: impl Into<String>,
        checksum: Option<String>,
        installed_to: Vec<String>,
    ) -> Self {
        Self {
            checksum,
            installed_to,
            retrieved_at: Local::now().fixed_offset(),
            upstream: upstream.into(),
            version: version.into(),
        }
    }
}

/// Mapping from installed path (relative to the invocation root) to entry
///
/// Serialized as a JSON object with sorted keys and 4-space indentation so
/// the file diffs cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lockfile {
    pub entries: BTreeMap<String, LockEntry>,
}

/// Entries confirmed current or freshly installed during one run; it
/// becomes the next lockfile.
pub type VerifiedSet = Lockfile;

impl Lockfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a lockfile; a missing file is an empty lockfile
    pub fn load(path: &Path) -> CwldepResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| CwldepError::Document(format!("Invalid lockfile {}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> CwldepResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Deterministic serialized form
    pub fn to_json(&self) -> CwldepResult<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        String::from_utf8(buf)
            .map_err(|e| CwldepError::Document(format!("Lockfile is not UTF-8: {}", e)))
    }

    /// Write atomically via a sibling temp file
    pub fn save(&self, path: &Path) -> CwldepResult<()> {
        let content = self.to_json()?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CwldepError::Path(format!("Invalid lockfile path: {}", path.display())))?;
        let temp = path.with_file_name(format!(".{}.tmp", file_name));
        fs::write(&temp, content)?;
        fs::rename(&temp, path)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&LockEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut LockEntry> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: String, entry: LockEntry) -> Option<LockEntry> {
        self.entries.insert(key, entry)
    }

    pub fn remove(&mut self, key: &str) -> Option<LockEntry> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LockEntry)> {
        self.entries.iter()
    }
}
