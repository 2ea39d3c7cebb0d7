//! Archive format detection from file names

use crate::{Error, Result};
use std::fmt;
use std::path::Path;

/// Framing of an archive file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Plain tar stream
    Tar,
    /// Tar stream inside gzip framing
    TarGz,
}

impl ArchiveFormat {
    /// Classify a file name, `None` when neither form matches
    ///
    /// The name is lowercased and its extension is whatever follows the last
    /// dot. `gz` counts only when the name also contains `tar.gz`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        let ext = name.rsplit('.').next().unwrap_or("");

        if ext == "gz" && name.contains("tar.gz") {
            Some(ArchiveFormat::TarGz)
        } else if ext == "tar" {
            Some(ArchiveFormat::Tar)
        } else {
            None
        }
    }

    /// Classify the file name of `path`
    pub fn detect(path: &Path) -> Result<Self> {
        let name = file_name(path);
        Self::from_file_name(&name).ok_or(Error::UnsupportedFormat(name))
    }

    /// Canonical extension, without the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }

    /// Whether `path`'s name ends with this format's extension (case-insensitive)
    pub fn matches_suffix(self, path: &Path) -> bool {
        file_name(path)
            .to_lowercase()
            .ends_with(&format!(".{}", self.extension()))
    }

    /// Fail with [`Error::InvalidExtension`] unless `path` ends with this format's extension
    pub fn require_suffix(self, path: &Path) -> Result<()> {
        if self.matches_suffix(path) {
            Ok(())
        } else {
            Err(Error::InvalidExtension {
                path: path.to_path_buf(),
                expected: self.extension(),
            })
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_name() {
        assert_eq!(ArchiveFormat::from_file_name("a.tar"), Some(ArchiveFormat::Tar));
        assert_eq!(ArchiveFormat::from_file_name("A.TAR"), Some(ArchiveFormat::Tar));
        assert_eq!(
            ArchiveFormat::from_file_name("backup.tar.gz"),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::from_file_name("Backup.TAR.GZ"),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(ArchiveFormat::from_file_name("a.zip"), None);
        assert_eq!(ArchiveFormat::from_file_name("a.gz"), None);
        assert_eq!(ArchiveFormat::from_file_name("a.tgz"), None);
        assert_eq!(ArchiveFormat::from_file_name("tar"), Some(ArchiveFormat::Tar));
        assert_eq!(ArchiveFormat::from_file_name(""), None);
    }

    #[test]
    fn test_detect_reports_name() {
        match ArchiveFormat::detect(Path::new("/tmp/a.zip")) {
            Err(Error::UnsupportedFormat(name)) => assert_eq!(name, "a.zip"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_suffix_checks() {
        assert!(ArchiveFormat::Tar.matches_suffix(Path::new("out.TAR")));
        assert!(!ArchiveFormat::Tar.matches_suffix(Path::new("out.txt")));
        assert!(!ArchiveFormat::Tar.matches_suffix(Path::new("tar")));
        assert!(ArchiveFormat::TarGz.matches_suffix(Path::new("dir/out.tar.gz")));
        assert!(!ArchiveFormat::TarGz.matches_suffix(Path::new("out.gz")));
        assert!(matches!(
            ArchiveFormat::Tar.require_suffix(Path::new("out.txt")),
            Err(Error::InvalidExtension { expected: "tar", .. })
        ));
    }
}
