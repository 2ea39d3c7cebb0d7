//! Error types for dirtar-core

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for the dirtar library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Path could not be mapped onto an archive entry
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// File name does not carry the extension the operation requires
    #[error("Invalid extension: {path:?} must end with .{expected}")]
    InvalidExtension { path: PathBuf, expected: &'static str },

    /// Unsupported archive format
    #[error("Unsupported format: {0}. Supported: tar.gz, tar")]
    UnsupportedFormat(String),

    /// Resource not found
    #[error("Not found: {0:?}")]
    NotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),

    /// Path is not an existing regular file
    #[error("Not a file: {0:?}")]
    NotAFile(PathBuf),

    /// File already exists at destination
    #[error("File exists: {0:?}")]
    FileExists(PathBuf),

    /// Archive entry would be written outside the extraction root
    #[error("Unsafe entry {path:?}: {reason}")]
    UnsafeEntry { path: PathBuf, reason: String },

    /// Archive-related error occurred
    #[error("Archive error: {0}")]
    Archive(String),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::Io(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
