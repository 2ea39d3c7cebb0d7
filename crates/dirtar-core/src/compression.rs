//! Gzip framing around tar byte streams

use crate::archive::ArchiveFormat;
use crate::{Error, Result, BUFFER_SIZE};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use tracing::info;

/// Gzip level used when none is configured
pub const DEFAULT_LEVEL: u32 = 6;

/// Compress everything written to `output`
///
/// The returned encoder must be finished with [`GzEncoder::finish`] to emit
/// the gzip trailer. Levels above 9 are clamped.
pub fn wrap_output<W: Write>(output: W, level: u32) -> GzEncoder<W> {
    GzEncoder::new(output, Compression::new(level.min(9)))
}

/// Decompress everything read from `input`, across concatenated gzip members
pub fn wrap_input<R: Read>(input: R) -> MultiGzDecoder<R> {
    MultiGzDecoder::new(input)
}

/// Gzip an existing `.tar` file into a new `.tar.gz` file
pub fn gzip_tar_file<P: AsRef<Path>, Q: AsRef<Path>>(source: P, dest: Q) -> Result<()> {
    gzip_tar_file_with_level(source.as_ref(), dest.as_ref(), DEFAULT_LEVEL)
}

/// [`gzip_tar_file`] with an explicit gzip level
///
/// `source` must be an existing file ending with `.tar`; `dest` must end with
/// `.tar.gz` and must not exist yet. Nothing is created unless all of these hold.
pub fn gzip_tar_file_with_level(source: &Path, dest: &Path, level: u32) -> Result<()> {
    if !source.exists() {
        return Err(Error::NotFound(source.to_path_buf()));
    }
    if !source.is_file() {
        return Err(Error::NotAFile(source.to_path_buf()));
    }
    ArchiveFormat::Tar.require_suffix(source)?;
    ArchiveFormat::TarGz.require_suffix(dest)?;
    if dest.exists() {
        return Err(Error::FileExists(dest.to_path_buf()));
    }

    info!("Compressing {:?} into {:?}", source, dest);

    let mut input = File::open(source)?;
    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => Error::FileExists(dest.to_path_buf()),
            _ => Error::Io(e),
        })?;
    let mut encoder = wrap_output(BufWriter::new(output), level);

    let mut buf = [0u8; BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        encoder.write_all(&buf[..n])?;
        total += n as u64;
    }

    let mut output = encoder.finish()?;
    output.flush()?;

    info!(bytes = total, "Successfully compressed archive: {:?}", dest);
    Ok(())
}
