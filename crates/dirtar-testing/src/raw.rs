//! Hand-built archives with entry names the `tar` crate refuses to write
//!
//! `Header::set_path` rejects `..` components and absolute paths, so the
//! name field is filled in byte by byte here.

use anyhow::{bail, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tar::{Builder, EntryType, Header};

/// One entry of a raw archive
pub struct RawEntry<'a> {
    pub name: &'a [u8],
    pub kind: EntryType,
    pub data: &'a [u8],
}

impl<'a> RawEntry<'a> {
    pub fn file(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: name.as_bytes(),
            kind: EntryType::Regular,
            data,
        }
    }

    pub fn dir(name: &'a str) -> Self {
        Self {
            name: name.as_bytes(),
            kind: EntryType::Directory,
            data: &[],
        }
    }

    pub fn symlink(name: &'a str) -> Self {
        Self {
            name: name.as_bytes(),
            kind: EntryType::Symlink,
            data: &[],
        }
    }
}

fn append_raw<W: Write>(builder: &mut Builder<W>, entry: &RawEntry<'_>) -> Result<()> {
    let mut header = Header::new_old();
    let name_field = &mut header.as_old_mut().name;
    if entry.name.len() > name_field.len() {
        bail!("raw entry name longer than {} bytes", name_field.len());
    }
    name_field[..entry.name.len()].copy_from_slice(entry.name);

    header.set_entry_type(entry.kind);
    header.set_size(entry.data.len() as u64);
    header.set_mode(if entry.kind == EntryType::Directory {
        0o755
    } else {
        0o644
    });
    header.set_mtime(1_600_000_000);
    header.set_cksum();

    builder.append(&header, entry.data)?;
    Ok(())
}

/// Writes a plain tar archive containing `entries` verbatim
pub fn write_raw_tar(path: &Path, entries: &[RawEntry<'_>]) -> Result<()> {
    let mut builder = Builder::new(File::create(path)?);
    for entry in entries {
        append_raw(&mut builder, entry)?;
    }
    builder.into_inner()?.flush()?;
    Ok(())
}

/// Writes a gzip-compressed tar archive containing `entries` verbatim
pub fn write_raw_tar_gz(path: &Path, entries: &[RawEntry<'_>]) -> Result<()> {
    let encoder = GzEncoder::new(File::create(path)?, Compression::default());
    let mut builder = Builder::new(encoder);
    for entry in entries {
        append_raw(&mut builder, entry)?;
    }
    builder.into_inner()?.finish()?.flush()?;
    Ok(())
}
