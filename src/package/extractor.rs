use crate::core::{CwldepError, CwldepResult};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;
use zip::ZipArchive;

/// Supported archive formats, chosen by file suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarBz2,
    Zip,
}

impl ArchiveFormat {
    const SUFFIXES: &'static [(&'static str, ArchiveFormat)] = &[
        (".tar.gz", ArchiveFormat::TarGz),
        (".tgz", ArchiveFormat::TarGz),
        (".tar.bz2", ArchiveFormat::TarBz2),
        (".tbz2", ArchiveFormat::TarBz2),
        (".zip", ArchiveFormat::Zip),
    ];

    /// Detect the format of a file name or URL path
    pub fn from_name(name: &str) -> Option<Self> {
        Self::SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|(_, format)| *format)
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_name)
    }

    /// File name with the archive suffix removed (`x.tar.gz` -> `x`)
    pub fn stem<'a>(&self, file_name: &'a str) -> &'a str {
        Self::SUFFIXES
            .iter()
            .filter(|(_, format)| format == self)
            .find_map(|(suffix, _)| file_name.strip_suffix(suffix))
            .unwrap_or(file_name)
    }
}

/// Extracts dependency archives (tar.gz, tar.bz2, zip) next to the archive
pub struct PackageExtractor {
    dest_dir: PathBuf,
}

impl PackageExtractor {
    pub fn new(dest_dir: PathBuf) -> Self {
        Self { dest_dir }
    }

    /// Directory an archive extracts into: `<dest_dir>/<archive stem>`
    pub fn extraction_dir(&self, archive_path: &Path) -> CwldepResult<PathBuf> {
        let format = detect(archive_path)?;
        Ok(self.dest_dir.join(format.stem(file_name(archive_path)?)))
    }

    /// Extract an archive, detecting its format from the file name
    /// Returns the extraction directory
    pub fn extract(&self, archive_path: &Path) -> CwldepResult<PathBuf> {
        self.extract_as(archive_path, detect(archive_path)?)
    }

    /// Extract an archive of a known format
    ///
    /// The archive is unpacked into a `.tmp-<stem>` sibling first, which
    /// then replaces any previous extraction directory.
    pub fn extract_as(&self, archive_path: &Path, format: ArchiveFormat) -> CwldepResult<PathBuf> {
        let stem = format.stem(file_name(archive_path)?);
        let temp_dir = self.dest_dir.join(format!(".tmp-{}", stem));
        let target = self.dest_dir.join(stem);

        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir)?;
        }
        fs::create_dir_all(&temp_dir)?;

        if let Err(e) = unpack(archive_path, format, &temp_dir) {
            let _ = fs::remove_dir_all(&temp_dir);
            return Err(CwldepError::Archive(format!(
                "Failed to extract {}: {}",
                archive_path.display(),
                e
            )));
        }

        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        fs::rename(&temp_dir, &target)?;
        Ok(target)
    }
}

fn detect(archive_path: &Path) -> CwldepResult<ArchiveFormat> {
    ArchiveFormat::from_path(archive_path).ok_or_else(|| {
        CwldepError::Archive(format!("Unsupported format: {}", archive_path.display()))
    })
}

fn file_name(path: &Path) -> CwldepResult<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CwldepError::Path(format!("Invalid archive path: {}", path.display())))
}

fn unpack(archive_path: &Path, format: ArchiveFormat, dest: &Path) -> CwldepResult<()> {
    match format {
        ArchiveFormat::TarGz => unpack_tar(GzDecoder::new(File::open(archive_path)?), dest),
        ArchiveFormat::TarBz2 => unpack_tar(BzDecoder::new(File::open(archive_path)?), dest),
        ArchiveFormat::Zip => unpack_zip(archive_path, dest),
    }
}

// `unpack` skips entries that would land outside `dest`
fn unpack_tar<R: Read>(reader: R, dest: &Path) -> CwldepResult<()> {
    let mut archive = Archive::new(reader);
    archive.unpack(dest)?;
    Ok(())
}

fn unpack_zip(archive_path: &Path, dest: &Path) -> CwldepResult<()> {
    let file = File::open(archive_path)?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| CwldepError::Archive(format!("Invalid zip: {}", e)))?;
    archive
        .extract(dest)
        .map_err(|e| CwldepError::Archive(format!("Extract failed: {}", e)))
}
