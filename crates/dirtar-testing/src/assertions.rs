//! Common assertions for dirtar testing

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Every regular file under `root`, keyed by `/`-separated relative path
pub fn collect_files(root: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root)?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.insert(key, std::fs::read(entry.path())?);
    }
    Ok(files)
}

/// Every directory under `root`, as `/`-separated relative paths
pub fn collect_dirs(root: &Path) -> Result<Vec<String>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            let relative = entry.path().strip_prefix(root)?;
            dirs.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(dirs)
}

/// Asserts that both trees hold the same regular files with the same bytes
///
/// Directories are not compared; a tree without empty directories matches
/// one that has them.
pub fn assert_same_files(expected: &Path, actual: &Path) -> Result<()> {
    let expected_files = collect_files(expected)?;
    let actual_files = collect_files(actual)?;

    assert_eq!(
        expected_files.keys().collect::<Vec<_>>(),
        actual_files.keys().collect::<Vec<_>>(),
        "Different file sets under {:?} and {:?}",
        expected,
        actual
    );

    for (path, content) in &expected_files {
        assert!(
            &actual_files[path] == content,
            "Content mismatch for {}",
            path
        );
    }

    Ok(())
}
