//! Depth-first traversal of a source directory

use super::path::relative_entry_path;
use crate::events::{Event, EventSink};
use crate::Result;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Kind of a visited node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// A filesystem node discovered during the walk
#[derive(Debug, Clone)]
pub struct SourceNode {
    /// Path on disk, as reached from the walk root
    pub path: PathBuf,
    /// Archive-relative path, `/`-separated
    pub entry_path: String,
    pub kind: NodeKind,
    /// Byte length at open time, zero for directories
    pub size: u64,
}

/// Receives the nodes of a walk in traversal order
///
/// An error returned from either method aborts the walk.
pub trait Visitor {
    fn visit_directory(&mut self, node: &SourceNode, events: &mut dyn EventSink) -> Result<()>;

    /// `file` is already open for reading and is dropped when the call returns
    fn visit_file(
        &mut self,
        node: &SourceNode,
        file: File,
        events: &mut dyn EventSink,
    ) -> Result<()>;
}

/// Counters for a finished walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub files: u64,
    pub directories: u64,
    pub skipped: u64,
    pub bytes: u64,
}

/// Walks every descendant of a root directory, never the root itself
///
/// Children are visited in directory-listing order unless sorting is
/// enabled, and a directory is finished before its next sibling starts.
/// Nodes that cannot be read are reported to the event sink and left out.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    follow_symlinks: bool,
    sort_entries: bool,
    exclude: Option<PathBuf>,
}

impl TreeWalker {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: true,
            sort_entries: false,
            exclude: None,
        }
    }

    /// Resolve symlinks and walk what they point to (default: on)
    pub fn follow_symlinks(mut self, yes: bool) -> Self {
        self.follow_symlinks = yes;
        self
    }

    /// Visit siblings in file-name order instead of listing order
    pub fn sort_entries(mut self, yes: bool) -> Self {
        self.sort_entries = yes;
        self
    }

    /// Never visit `path`, typically the archive being written
    pub fn exclude<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.exclude = Some(path.into());
        self
    }

    pub fn walk(
        &self,
        visitor: &mut dyn Visitor,
        events: &mut dyn EventSink,
    ) -> Result<WalkSummary> {
        let excluded = self
            .exclude
            .as_deref()
            .and_then(|path| excluded_entry(&self.root, path));

        let mut walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(self.follow_symlinks);
        if self.sort_entries {
            walker = walker.sort_by_file_name();
        }

        let mut summary = WalkSummary::default();
        let mut it = walker.into_iter();

        while let Some(entry) = it.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    // Listing the root itself is not a per-node problem
                    if err.depth() == 0 {
                        return Err(err.into());
                    }
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    events.emit(Event::Skipped {
                        path,
                        reason: err.to_string(),
                    });
                    summary.skipped += 1;
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();

            if entry.file_name().to_str().is_none() {
                if file_type.is_dir() {
                    it.skip_current_dir();
                }
                events.emit(Event::Skipped {
                    path: path.to_path_buf(),
                    reason: "file name is not valid UTF-8".to_string(),
                });
                summary.skipped += 1;
                continue;
            }

            let entry_path = relative_entry_path(&self.root, path)?;

            if excluded.as_deref() == Some(entry_path.as_str()) {
                debug!(path = ?path, "Not archiving the archive into itself");
                continue;
            }

            if file_type.is_dir() {
                let node = SourceNode {
                    path: path.to_path_buf(),
                    entry_path,
                    kind: NodeKind::Directory,
                    size: 0,
                };
                visitor.visit_directory(&node, events)?;
                summary.directories += 1;
            } else if file_type.is_file() {
                let (file, size) = match open_for_reading(path) {
                    Ok(opened) => opened,
                    Err(err) => {
                        events.emit(Event::Skipped {
                            path: path.to_path_buf(),
                            reason: err.to_string(),
                        });
                        summary.skipped += 1;
                        continue;
                    }
                };
                let node = SourceNode {
                    path: path.to_path_buf(),
                    entry_path,
                    kind: NodeKind::File,
                    size,
                };
                visitor.visit_file(&node, file, events)?;
                summary.files += 1;
                summary.bytes += size;
            } else {
                events.emit(Event::Skipped {
                    path: path.to_path_buf(),
                    reason: "not a regular file or directory".to_string(),
                });
                summary.skipped += 1;
            }
        }

        Ok(summary)
    }
}

fn open_for_reading(path: &Path) -> std::io::Result<(File, u64)> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    Ok((file, size))
}

/// Entry path that `path` would get under `root`, if it lies inside it
fn excluded_entry(root: &Path, path: &Path) -> Option<String> {
    let root = root.canonicalize().ok()?;
    let path = path.canonicalize().ok()?;
    relative_entry_path(&root, &path).ok()
}
