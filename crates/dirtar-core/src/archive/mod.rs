//! Archive operations module

pub mod extractor;
pub mod format;
pub mod path;
pub mod walker;
pub mod writer;

pub use extractor::{
    extract_files, extract_files_with, list_entries, EntryInfo, EntryKind, ExtractSummary,
};
pub use format::ArchiveFormat;
pub use walker::{NodeKind, SourceNode, TreeWalker, Visitor, WalkSummary};
pub use writer::{
    create_directory_tar, create_directory_tar_gz, create_directory_tar_gz_with,
    create_directory_tar_with, ArchiveWriter,
};

use serde::{Deserialize, Serialize};

/// Pack options for archive creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackOptions {
    /// Visit siblings in file-name order for reproducible archives
    pub sort_entries: bool,
    /// Write explicit directory entries so empty directories survive a round trip
    pub directory_entries: bool,
    /// Archive what symlinks point to (links themselves are never stored)
    pub follow_symlinks: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            sort_entries: false,
            directory_entries: false,
            follow_symlinks: true,
        }
    }
}

/// What to do with an entry whose path would leave the destination root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsafeEntryPolicy {
    /// Report the entry and carry on with the next one
    #[default]
    Skip,
    /// Fail the whole extraction
    Abort,
}

/// Extract options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Replace files that already exist at the destination
    pub overwrite: bool,
    /// Apply the mode stored in each header (Unix only)
    pub preserve_permissions: bool,
    /// Apply the modification time stored in each header
    pub preserve_mtime: bool,
    /// Handling of entries that try to escape the destination
    pub unsafe_entries: UnsafeEntryPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            preserve_permissions: false,
            preserve_mtime: true,
            unsafe_entries: UnsafeEntryPolicy::Skip,
        }
    }
}
