//! Testing utilities and fixtures for dirtar
//!
//! Shared by the integration tests of `dirtar-core` and `dirtar-cli`.
//! Archives built here go through the `tar` crate directly, never through
//! `dirtar-core`.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub mod assertions;
pub mod fixtures;
pub mod raw;

/// Temporary area holding source trees, archives and extraction targets
///
/// Everything is removed when the value is dropped. Names are relative to
/// the scratch root and may contain `/`.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Where `name` lives, whether or not it exists yet
    pub fn join<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `content` to `name`, creating missing parents
    pub fn write_file<P: AsRef<Path>>(&self, name: P, content: &[u8]) -> Result<PathBuf> {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Create `name` and any missing parents
    pub fn make_dir<P: AsRef<Path>>(&self, name: P) -> Result<PathBuf> {
        let path = self.join(name);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Remove every permission bit from an existing file
    ///
    /// Returns `false` when the file can still be opened afterwards, which is
    /// the case for privileged users; callers should then skip checks that
    /// rely on the file being unreadable.
    #[cfg(unix)]
    pub fn lock_file<P: AsRef<Path>>(&self, name: P) -> Result<bool> {
        use std::os::unix::fs::PermissionsExt;

        let path = self.join(name);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000))?;
        Ok(fs::File::open(&path).is_err())
    }
}
