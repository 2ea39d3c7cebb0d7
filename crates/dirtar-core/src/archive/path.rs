//! Mapping between filesystem paths and archive entry paths

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::error;

/// Archive-relative path of `node`, a descendant of `root`
///
/// Components are joined with `/` and no leading separator is produced.
/// A `node` outside `root`, or equal to it, is a caller bug and fails with
/// [`Error::InvalidPath`].
pub fn relative_entry_path(root: &Path, node: &Path) -> Result<String> {
    let relative = node.strip_prefix(root).map_err(|_| {
        error!(root = ?root, node = ?node, "Node is not inside the archive root");
        Error::InvalidPath(format!("{:?} is not inside {:?}", node, root))
    })?;

    let mut entry_path = String::new();
    for component in relative.components() {
        let name = match component {
            Component::Normal(name) => name,
            Component::CurDir => continue,
            _ => {
                return Err(Error::InvalidPath(format!(
                    "Unexpected component {:?} in {:?}",
                    component, node
                )))
            }
        };
        let name = name
            .to_str()
            .ok_or_else(|| Error::InvalidPath(format!("Non UTF-8 file name in {:?}", node)))?;

        if !entry_path.is_empty() {
            entry_path.push('/');
        }
        entry_path.push_str(name);
    }

    if entry_path.is_empty() {
        return Err(Error::InvalidPath(format!(
            "{:?} is the archive root itself",
            node
        )));
    }

    Ok(entry_path)
}

/// Location under `dest_root` where the entry named `entry_path` is written
///
/// A leading separator and `.` components are dropped, so `/a/b`, `./a/b`
/// and `a/b` all land on `dest_root/a/b`. Parent-directory components, drive
/// prefixes and paths naming nothing at all are refused.
pub fn destination_path(dest_root: &Path, entry_path: &Path) -> Result<PathBuf> {
    let mut result = dest_root.to_path_buf();
    let mut depth = 0usize;

    for component in entry_path.components() {
        match component {
            Component::Normal(name) => {
                result.push(name);
                depth += 1;
            }
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir => {
                return Err(unsafe_entry(entry_path, "parent directory component"));
            }
            Component::Prefix(_) => {
                return Err(unsafe_entry(entry_path, "path prefix not allowed"));
            }
        }
    }

    if depth == 0 {
        return Err(unsafe_entry(entry_path, "empty entry path"));
    }

    Ok(result)
}

/// True for entry paths such as `./` or `/` that name the archive root
pub fn is_root_marker(entry_path: &Path) -> bool {
    entry_path
        .components()
        .all(|c| matches!(c, Component::CurDir | Component::RootDir))
}

fn unsafe_entry(entry_path: &Path, reason: &str) -> Error {
    Error::UnsafeEntry {
        path: entry_path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_entry_path_nested() {
        let root = Path::new("/data/src");
        let node = Path::new("/data/src/sub/dir/file.txt");
        assert_eq!(
            relative_entry_path(root, node).unwrap(),
            "sub/dir/file.txt"
        );
    }

    #[test]
    fn test_relative_entry_path_direct_child() {
        let root = Path::new("/data/src");
        assert_eq!(
            relative_entry_path(root, Path::new("/data/src/a")).unwrap(),
            "a"
        );
    }

    #[test]
    fn test_relative_entry_path_outside_root() {
        let root = Path::new("/data/src");
        assert!(matches!(
            relative_entry_path(root, Path::new("/data/other/a")),
            Err(Error::InvalidPath(_))
        ));
        // String prefix alone is not enough
        assert!(relative_entry_path(root, Path::new("/data/srcfoo/a")).is_err());
    }

    #[test]
    fn test_relative_entry_path_root_itself() {
        let root = Path::new("/data/src");
        assert!(relative_entry_path(root, root).is_err());
    }

    #[test]
    fn test_destination_path_plain_and_leading_separator() {
        let dest = Path::new("/out");
        assert_eq!(
            destination_path(dest, Path::new("a/b.txt")).unwrap(),
            PathBuf::from("/out/a/b.txt")
        );
        assert_eq!(
            destination_path(dest, Path::new("/a/b.txt")).unwrap(),
            PathBuf::from("/out/a/b.txt")
        );
        assert_eq!(
            destination_path(dest, Path::new("./a/./b.txt")).unwrap(),
            PathBuf::from("/out/a/b.txt")
        );
    }

    #[test]
    fn test_destination_path_rejects_traversal() {
        let dest = Path::new("/out");
        for bad in ["../evil", "../../evil", "a/../../evil", "a/.."] {
            assert!(
                matches!(
                    destination_path(dest, Path::new(bad)),
                    Err(Error::UnsafeEntry { .. })
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_destination_path_rejects_empty() {
        let dest = Path::new("/out");
        assert!(destination_path(dest, Path::new("")).is_err());
        assert!(destination_path(dest, Path::new("./")).is_err());
        assert!(destination_path(dest, Path::new("/")).is_err());
    }

    #[test]
    fn test_root_marker() {
        assert!(is_root_marker(Path::new("./")));
        assert!(is_root_marker(Path::new("/")));
        assert!(!is_root_marker(Path::new("./a")));
        assert!(!is_root_marker(Path::new("..")));
    }
}
