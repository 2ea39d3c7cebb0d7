//! Common source trees for dirtar tests

use crate::Scratch;
use anyhow::Result;
use std::path::PathBuf;

/// Creates a small mixed tree under `name` and returns its root
///
/// Contains text files at several depths, a binary file, a file larger than
/// the copy buffer, an empty file and an empty directory.
pub fn create_source_tree(scratch: &Scratch, name: &str) -> Result<PathBuf> {
    let root = scratch.make_dir(name)?;

    scratch.write_file(&format!("{name}/file1.txt"), b"This is file 1 content.")?;
    scratch.write_file(&format!("{name}/file2.txt"), b"This is file 2 content.")?;
    scratch.write_file(&format!("{name}/subdir/file3.txt"), b"This is file 3 in subdir.")?;
    scratch.write_file(
        &format!("{name}/subdir/nested/deeper/file4.txt"),
        b"Four levels down.",
    )?;

    // Binary file (simple image placeholder)
    scratch.write_file(&format!("{name}/image.jpg"), &[0xFF, 0xD8, 0xFF, 0xE0, 0x00])?;

    // Spans many copy buffers and does not end on a tar block boundary
    let large: Vec<u8> = (0..100_003u32).map(|i| (i % 251) as u8).collect();
    scratch.write_file(&format!("{name}/large.bin"), &large)?;

    scratch.write_file(&format!("{name}/empty.txt"), b"")?;
    scratch.make_dir(&format!("{name}/empty_dir"))?;

    Ok(root)
}

/// Creates a symlink test structure (Unix only)
#[cfg(unix)]
pub fn create_symlink_structure(scratch: &Scratch, name: &str) -> Result<PathBuf> {
    use std::os::unix::fs::symlink;

    let root = scratch.make_dir(name)?;
    let target = scratch.write_file(&format!("{name}/file1.txt"), b"Original file")?;
    symlink(&target, root.join("link_to_file1.txt"))?;
    symlink(root.join("does_not_exist"), root.join("dangling"))?;

    Ok(root)
}
