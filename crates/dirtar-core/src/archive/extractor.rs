//! Tar archive extraction into a destination directory

use super::format::ArchiveFormat;
use super::path::{destination_path, is_root_marker};
use super::{ExtractOptions, UnsafeEntryPolicy};
use crate::compression;
use crate::events::{Event, EventSink, TracingSink};
use crate::{Error, Result, BUFFER_SIZE};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tar::{Archive, EntryType, Header};
use tracing::{debug, info};

/// Kind of an archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
    /// Symlinks, devices, global headers and the like; never extracted
    Other,
}

impl From<EntryType> for EntryKind {
    fn from(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Directory => EntryKind::Directory,
            EntryType::Regular | EntryType::Continuous => EntryKind::File,
            _ => EntryKind::Other,
        }
    }
}

/// Archive entry information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    /// Path within the archive, as stored
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Declared content size in bytes
    pub size: u64,
    /// Unix permissions (if available)
    pub mode: Option<u32>,
    /// Modification time (Unix timestamp)
    pub mtime: Option<u64>,
}

/// Counters for a finished extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: u64,
    pub directories: u64,
    pub bytes: u64,
    pub rejected: u64,
    pub ignored: u64,
}

/// Extract a `.tar` or `.tar.gz` file into `dest_dir`
///
/// `dest_dir` is created if it does not exist. Entries whose path would
/// land outside `dest_dir` are reported and skipped.
pub fn extract_files<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    dest_dir: Q,
) -> Result<ExtractSummary> {
    extract_files_with(
        source.as_ref(),
        dest_dir.as_ref(),
        &ExtractOptions::default(),
        &mut TracingSink,
    )
}

/// [`extract_files`] with explicit options and event sink
pub fn extract_files_with(
    source: &Path,
    dest_dir: &Path,
    options: &ExtractOptions,
    events: &mut dyn EventSink,
) -> Result<ExtractSummary> {
    if dest_dir.exists() && !dest_dir.is_dir() {
        return Err(Error::NotADirectory(dest_dir.to_path_buf()));
    }
    if !source.is_file() {
        return Err(Error::NotAFile(source.to_path_buf()));
    }
    let format = ArchiveFormat::detect(source)?;

    info!("Extracting {:?} ({}) to {:?}", source, format, dest_dir);

    fs::create_dir_all(dest_dir)?;

    let mut archive = open_archive(source, format)?;
    let mut buf = [0u8; BUFFER_SIZE];
    let mut summary = ExtractSummary::default();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() && is_root_marker(&entry_path) {
            continue;
        }

        let dest_path = match destination_path(dest_dir, &entry_path) {
            Ok(dest_path) => dest_path,
            Err(err) => match options.unsafe_entries {
                UnsafeEntryPolicy::Skip => {
                    events.emit(Event::Rejected {
                        entry_path,
                        reason: err.to_string(),
                    });
                    summary.rejected += 1;
                    continue;
                }
                UnsafeEntryPolicy::Abort => return Err(err),
            },
        };

        debug!("Extracting: {:?}", dest_path);

        match EntryKind::from(entry_type) {
            EntryKind::Directory => {
                fs::create_dir_all(&dest_path)?;
                summary.directories += 1;
            }
            EntryKind::File => {
                if !options.overwrite && dest_path.exists() {
                    events.emit(Event::Ignored {
                        entry_path,
                        reason: "destination already exists".to_string(),
                    });
                    summary.ignored += 1;
                    continue;
                }
                if let Some(parent) = dest_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let declared = entry.size();
                let written = copy_entry(&mut entry, &dest_path, &mut buf)?;
                if written != declared {
                    return Err(Error::Archive(format!(
                        "Truncated entry {:?}: declared {} bytes, found {}",
                        entry_path, declared, written
                    )));
                }
                apply_metadata(&dest_path, entry.header(), options);
                summary.files += 1;
                summary.bytes += written;
            }
            EntryKind::Other => {
                events.emit(Event::Ignored {
                    entry_path,
                    reason: format!("unsupported entry type {:?}", entry_type),
                });
                summary.ignored += 1;
                continue;
            }
        }

        events.emit(Event::Extracted { path: dest_path });
    }

    info!(
        files = summary.files,
        bytes = summary.bytes,
        rejected = summary.rejected,
        "Successfully extracted archive"
    );
    Ok(summary)
}

/// Read every header of a `.tar` or `.tar.gz` file without extracting
pub fn list_entries<P: AsRef<Path>>(source: P) -> Result<Vec<EntryInfo>> {
    let source = source.as_ref();
    if !source.is_file() {
        return Err(Error::NotAFile(source.to_path_buf()));
    }
    let format = ArchiveFormat::detect(source)?;

    info!("Inspecting {} archive: {:?}", format, source);

    let mut archive = open_archive(source, format)?;
    let mut entries = Vec::new();

    for entry in archive.entries()? {
        let entry = entry?;
        let header = entry.header();

        entries.push(EntryInfo {
            path: entry.path()?.into_owned(),
            kind: EntryKind::from(header.entry_type()),
            size: entry.size(),
            mode: header.mode().ok(),
            mtime: header.mtime().ok(),
        });
    }

    info!("Found {} entries in archive", entries.len());
    Ok(entries)
}

fn open_archive(source: &Path, format: ArchiveFormat) -> Result<Archive<Box<dyn Read>>> {
    let file = BufReader::new(File::open(source)?);
    let reader: Box<dyn Read> = match format {
        ArchiveFormat::Tar => Box::new(file),
        ArchiveFormat::TarGz => Box::new(compression::wrap_input(file)),
    };
    Ok(Archive::new(reader))
}

/// Copy one entry's content into a freshly created file, closed on return
fn copy_entry<R: Read>(entry: &mut R, dest_path: &Path, buf: &mut [u8]) -> Result<u64> {
    let mut output = File::create(dest_path)?;
    let mut total = 0u64;
    loop {
        let n = match entry.read(buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        output.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

/// Apply header metadata to an extracted file; failures are only logged
fn apply_metadata(path: &Path, header: &Header, options: &ExtractOptions) {
    #[cfg(unix)]
    if options.preserve_permissions {
        use std::os::unix::fs::PermissionsExt;

        if let Ok(mode) = header.mode() {
            if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
                debug!("Failed to set permissions on {:?}: {}", path, e);
            }
        }
    }

    if options.preserve_mtime {
        if let Ok(mtime) = header.mtime() {
            let mtime = filetime::FileTime::from_unix_time(mtime as i64, 0);
            if let Err(e) = filetime::set_file_mtime(path, mtime) {
                debug!("Failed to set mtime on {:?}: {}", path, e);
            }
        }
    }
}
