use crate::core::error::{CwldepError, CwldepResult};
use std::path::{Component, Path, PathBuf};

/// Suffix appended to a document path to name its lockfile
pub const LOCKFILE_SUFFIX: &str = ".dep.lock";

/// Get the cwldep home directory
///
/// Platform-specific locations:
/// - Windows: %APPDATA%\cwldep
/// - Linux: ~/.config/cwldep
/// - macOS: ~/Library/Application Support/cwldep
pub fn cwldep_home() -> CwldepResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| CwldepError::Path("Could not determine config directory".to_string()))?;
    Ok(config_dir.join("cwldep"))
}

/// Get the config file path
///
/// `CWLDEP_CONFIG` takes precedence over the platform location
/// (`<config dir>/cwldep/config.yaml`).
pub fn config_file() -> CwldepResult<PathBuf> {
    if let Some(path) = std::env::var_os("CWLDEP_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    Ok(cwldep_home()?.join("config.yaml"))
}

/// Lockfile that belongs to a workflow document (`<document>.dep.lock`)
pub fn lockfile_path(document: &Path) -> PathBuf {
    let mut name = document.as_os_str().to_os_string();
    name.push(LOCKFILE_SUFFIX);
    PathBuf::from(name)
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> CwldepResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Lexically normalize a path: drops `.` and folds `..` into its parent.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Lock key for `path`: relative to `root`, `/`-separated.
pub fn relative_key(path: &Path, root: &Path) -> String {
    let path = normalize_path(path);
    let root = normalize_path(root);
    let rel = pathdiff::diff_paths(&path, &root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve a lock key back to a filesystem path under `root`.
pub fn resolve_key(key: &str, root: &Path) -> PathBuf {
    let rel = Path::new(key);
    if rel.is_absolute() {
        rel.to_path_buf()
    } else {
        root.join(rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lockfile_path() {
        assert_eq!(
            lockfile_path(Path::new("workflows/main.cwl")),
            PathBuf::from("workflows/main.cwl.dep.lock")
        );
    }

    #[test]
    fn test_ensure_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");

        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
        // Second call is a no-op
        ensure_dir(&dir).unwrap();
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("a/./b/../c")),
            PathBuf::from("a/c")
        );
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_relative_key() {
        let root = Path::new("/work/project");
        assert_eq!(
            relative_key(Path::new("/work/project/example.com/tools/a.cwl"), root),
            "example.com/tools/a.cwl"
        );
        assert_eq!(
            relative_key(Path::new("/work/project/deps/../lib/x.zip"), root),
            "lib/x.zip"
        );
    }

    #[test]
    fn test_resolve_key_roundtrip() {
        let root = Path::new("/work/project");
        let path = resolve_key("example.com/a.cwl", root);
        assert_eq!(path, PathBuf::from("/work/project/example.com/a.cwl"));
        assert_eq!(relative_key(&path, root), "example.com/a.cwl");
    }
}
