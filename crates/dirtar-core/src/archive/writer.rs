//! Tar archive creation from a directory tree

use super::format::ArchiveFormat;
use super::walker::{SourceNode, TreeWalker, Visitor, WalkSummary};
use super::PackOptions;
use crate::compression;
use crate::events::{Event, EventSink, TracingSink};
use crate::{Error, Result, BUFFER_SIZE};
use std::fs::{self, File, Metadata};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use tar::{Builder, EntryType, Header, HeaderMode};
use tracing::{debug, info};

/// Pack `source_dir` into a new plain tar file at `dest_archive`
///
/// `dest_archive` must end with `.tar`. Only files produce entries unless
/// [`PackOptions::directory_entries`] is set.
pub fn create_directory_tar<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    dest_archive: Q,
) -> Result<WalkSummary> {
    create_directory_tar_with(
        source_dir.as_ref(),
        dest_archive.as_ref(),
        &PackOptions::default(),
        &mut TracingSink,
    )
}

/// [`create_directory_tar`] with explicit options and event sink
pub fn create_directory_tar_with(
    source_dir: &Path,
    dest_archive: &Path,
    options: &PackOptions,
    events: &mut dyn EventSink,
) -> Result<WalkSummary> {
    ArchiveFormat::Tar.require_suffix(dest_archive)?;
    check_source_dir(source_dir)?;

    info!("Packing {:?} into {:?}", source_dir, dest_archive);

    let output = BufWriter::new(File::create(dest_archive)?);
    let (mut output, summary) = pack_into(output, source_dir, dest_archive, options, events)?;
    output.flush()?;

    log_summary(dest_archive, &summary);
    Ok(summary)
}

/// Pack `source_dir` into a new gzip-compressed tar file at `dest_archive`
///
/// `dest_archive` must end with `.tar.gz`.
pub fn create_directory_tar_gz<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    dest_archive: Q,
) -> Result<WalkSummary> {
    create_directory_tar_gz_with(
        source_dir.as_ref(),
        dest_archive.as_ref(),
        &PackOptions::default(),
        compression::DEFAULT_LEVEL,
        &mut TracingSink,
    )
}

/// [`create_directory_tar_gz`] with explicit options, gzip level and event sink
pub fn create_directory_tar_gz_with(
    source_dir: &Path,
    dest_archive: &Path,
    options: &PackOptions,
    level: u32,
    events: &mut dyn EventSink,
) -> Result<WalkSummary> {
    ArchiveFormat::TarGz.require_suffix(dest_archive)?;
    check_source_dir(source_dir)?;

    info!(
        "Packing {:?} into {:?} (gzip level {})",
        source_dir, dest_archive, level
    );

    let encoder = compression::wrap_output(BufWriter::new(File::create(dest_archive)?), level);
    let (encoder, summary) = pack_into(encoder, source_dir, dest_archive, options, events)?;
    let mut output = encoder.finish()?;
    output.flush()?;

    log_summary(dest_archive, &summary);
    Ok(summary)
}

/// Walk `source_dir` and write its entries to `output`, returning `output`
/// once the tar trailer has been written
fn pack_into<W: Write>(
    output: W,
    source_dir: &Path,
    dest_archive: &Path,
    options: &PackOptions,
    events: &mut dyn EventSink,
) -> Result<(W, WalkSummary)> {
    let mut writer = ArchiveWriter::new(output, options);
    let summary = TreeWalker::new(source_dir)
        .follow_symlinks(options.follow_symlinks)
        .sort_entries(options.sort_entries)
        .exclude(dest_archive)
        .walk(&mut writer, events)?;
    let output = writer.finish()?;
    Ok((output, summary))
}

fn check_source_dir(source_dir: &Path) -> Result<()> {
    if !source_dir.exists() {
        return Err(Error::NotFound(source_dir.to_path_buf()));
    }
    if !source_dir.is_dir() {
        return Err(Error::NotADirectory(source_dir.to_path_buf()));
    }
    Ok(())
}

fn log_summary(dest_archive: &Path, summary: &WalkSummary) {
    info!(
        files = summary.files,
        bytes = summary.bytes,
        skipped = summary.skipped,
        "Successfully packed archive: {:?}",
        dest_archive
    );
}

/// Streams visited nodes into a tar byte stream
///
/// The underlying builder is finished exactly once, by [`ArchiveWriter::finish`].
pub struct ArchiveWriter<W: Write> {
    builder: Builder<W>,
    directory_entries: bool,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(output: W, options: &PackOptions) -> Self {
        Self {
            builder: Builder::new(output),
            directory_entries: options.directory_entries,
        }
    }

    /// Write one regular-file entry of exactly `size` bytes read from `data`
    ///
    /// Fails with [`Error::Archive`] if `data` ends before `size` bytes.
    pub fn append_file<R: Read>(
        &mut self,
        entry_path: &str,
        data: R,
        size: u64,
        metadata: Option<&Metadata>,
    ) -> Result<()> {
        let mut header = Header::new_gnu();
        if let Some(metadata) = metadata {
            header.set_metadata_in_mode(metadata, HeaderMode::Complete);
        } else {
            header.set_mode(0o644);
        }
        header.set_entry_type(EntryType::Regular);
        header.set_size(size);

        let mut reader = ChunkedReader::new(data.take(size));
        self.builder.append_data(&mut header, entry_path, &mut reader)?;

        if reader.bytes_read != size {
            return Err(Error::Archive(format!(
                "{} shrank while being archived: declared {} bytes, read {}",
                entry_path, size, reader.bytes_read
            )));
        }
        Ok(())
    }

    /// Write one directory entry
    pub fn append_directory(
        &mut self,
        entry_path: &str,
        metadata: Option<&Metadata>,
    ) -> Result<()> {
        let mut header = Header::new_gnu();
        if let Some(metadata) = metadata {
            header.set_metadata_in_mode(metadata, HeaderMode::Complete);
        } else {
            header.set_mode(0o755);
        }
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);

        self.builder.append_data(&mut header, entry_path, io::empty())?;
        Ok(())
    }

    /// Write the end-of-archive trailer and hand back the output
    pub fn finish(self) -> Result<W> {
        Ok(self.builder.into_inner()?)
    }
}

impl<W: Write> Visitor for ArchiveWriter<W> {
    fn visit_directory(&mut self, node: &SourceNode, events: &mut dyn EventSink) -> Result<()> {
        if !self.directory_entries {
            return Ok(());
        }

        let metadata = fs::metadata(&node.path).ok();
        self.append_directory(&node.entry_path, metadata.as_ref())?;
        events.emit(Event::DirectoryArchived {
            entry_path: node.entry_path.clone(),
        });
        Ok(())
    }

    fn visit_file(
        &mut self,
        node: &SourceNode,
        file: File,
        events: &mut dyn EventSink,
    ) -> Result<()> {
        debug!("Adding file: {:?} as {}", node.path, node.entry_path);

        let metadata = file.metadata()?;
        self.append_file(&node.entry_path, file, node.size, Some(&metadata))?;
        events.emit(Event::FileArchived {
            entry_path: node.entry_path.clone(),
            size: node.size,
        });
        Ok(())
    }
}

/// Hands out at most [`BUFFER_SIZE`] bytes per read and counts them
struct ChunkedReader<R> {
    inner: R,
    bytes_read: u64,
}

impl<R: Read> ChunkedReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
        }
    }
}

impl<R: Read> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(BUFFER_SIZE);
        let n = self.inner.read(&mut buf[..len])?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}
