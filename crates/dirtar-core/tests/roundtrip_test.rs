use dirtar_core::archive::{create_directory_tar_gz_with, create_directory_tar_with};
use dirtar_core::{
    create_directory_tar, create_directory_tar_gz, extract_files, list_entries, CollectingSink,
    EntryKind, Error, PackOptions,
};
use dirtar_testing::assertions::{assert_same_files, collect_dirs, collect_files};
use dirtar_testing::fixtures::create_source_tree;
use dirtar_testing::Scratch;
use std::fs;

#[test]
fn test_tar_roundtrip() {
    let scratch = Scratch::new().unwrap();
    let source = create_source_tree(&scratch, "source").unwrap();
    let archive = scratch.join("out.tar");
    let extract_dir = scratch.join("extracted");

    let summary = create_directory_tar(&source, &archive).unwrap();
    assert_eq!(summary.files, 7);
    assert_eq!(summary.skipped, 0);

    extract_files(&archive, &extract_dir).unwrap();

    assert_same_files(&source, &extract_dir).unwrap();
    // Entries are relative to the source root, which is not itself stored
    assert!(extract_dir.join("file1.txt").is_file());
    assert!(!extract_dir.join("source").exists());
}

#[test]
fn test_tar_gz_roundtrip() {
    let scratch = Scratch::new().unwrap();
    let source = create_source_tree(&scratch, "source").unwrap();
    let archive = scratch.join("out.tar.gz");
    let extract_dir = scratch.join("extracted");

    create_directory_tar_gz(&source, &archive).unwrap();

    // Really gzip on disk
    let magic = fs::read(&archive).unwrap();
    assert_eq!(&magic[..2], &[0x1f, 0x8b]);

    extract_files(&archive, &extract_dir).unwrap();
    assert_same_files(&source, &extract_dir).unwrap();
}

#[test]
fn test_uppercase_extension_is_accepted_for_extraction() {
    let scratch = Scratch::new().unwrap();
    let source = create_source_tree(&scratch, "source").unwrap();
    let archive = scratch.join("out.tar");
    create_directory_tar(&source, &archive).unwrap();

    let shouting = scratch.join("OUT.TAR");
    fs::rename(&archive, &shouting).unwrap();

    let extract_dir = scratch.join("extracted");
    extract_files(&shouting, &extract_dir).unwrap();
    assert_same_files(&source, &extract_dir).unwrap();
}

#[test]
fn test_extracting_twice_gives_same_tree() {
    let scratch = Scratch::new().unwrap();
    let source = create_source_tree(&scratch, "source").unwrap();
    let archive = scratch.join("out.tar.gz");
    let extract_dir = scratch.join("extracted");

    create_directory_tar_gz(&source, &archive).unwrap();
    extract_files(&archive, &extract_dir).unwrap();
    let first = collect_files(&extract_dir).unwrap();

    extract_files(&archive, &extract_dir).unwrap();
    let second = collect_files(&extract_dir).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_empty_directories_need_directory_entries() {
    let scratch = Scratch::new().unwrap();
    let source = create_source_tree(&scratch, "source").unwrap();

    let plain = scratch.join("plain.tar");
    create_directory_tar(&source, &plain).unwrap();
    let plain_out = scratch.join("plain_out");
    extract_files(&plain, &plain_out).unwrap();
    assert!(!plain_out.join("empty_dir").exists());

    let options = PackOptions {
        directory_entries: true,
        ..Default::default()
    };
    let with_dirs = scratch.join("with_dirs.tar.gz");
    create_directory_tar_gz_with(&source, &with_dirs, &options, 6, &mut CollectingSink::new())
        .unwrap();
    let dirs_out = scratch.join("dirs_out");
    extract_files(&with_dirs, &dirs_out).unwrap();

    assert!(dirs_out.join("empty_dir").is_dir());
    assert_eq!(
        collect_dirs(&source).unwrap(),
        collect_dirs(&dirs_out).unwrap()
    );
    assert_same_files(&source, &dirs_out).unwrap();
}

#[test]
fn test_sorted_archive_is_depth_first_in_name_order() {
    let scratch = Scratch::new().unwrap();
    let source = scratch.make_dir("source").unwrap();
    scratch.write_file("source/b.txt", b"b").unwrap();
    scratch.write_file("source/a/z.txt", b"z").unwrap();
    scratch.write_file("source/a/y/x.txt", b"x").unwrap();
    scratch.write_file("source/c.txt", b"c").unwrap();

    let options = PackOptions {
        sort_entries: true,
        directory_entries: true,
        ..Default::default()
    };
    let archive = scratch.join("sorted.tar");
    let mut events = CollectingSink::new();
    create_directory_tar_with(&source, &archive, &options, &mut events).unwrap();

    let names: Vec<String> = list_entries(&archive)
        .unwrap()
        .into_iter()
        .map(|e| e.path.to_string_lossy().trim_end_matches('/').to_string())
        .collect();
    assert_eq!(
        names,
        vec!["a", "a/y", "a/y/x.txt", "a/z.txt", "b.txt", "c.txt"]
    );
    assert_eq!(
        events.archived_files(),
        vec!["a/y/x.txt", "a/z.txt", "b.txt", "c.txt"]
    );
}

#[test]
fn test_list_entries_reports_sizes_and_kinds() {
    let scratch = Scratch::new().unwrap();
    let source = scratch.make_dir("source").unwrap();
    scratch.write_file("source/hello.txt", b"hello").unwrap();
    scratch.write_file("source/empty.txt", b"").unwrap();

    let archive = scratch.join("listing.tar.gz");
    create_directory_tar_gz(&source, &archive).unwrap();

    let mut entries = list_entries(&archive).unwrap();
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path.to_str(), Some("empty.txt"));
    assert_eq!(entries[0].size, 0);
    assert_eq!(entries[1].path.to_str(), Some("hello.txt"));
    assert_eq!(entries[1].size, 5);
    assert!(entries.iter().all(|e| e.kind == EntryKind::File));
    assert!(entries.iter().all(|e| e.mtime.is_some()));
}

#[test]
fn test_empty_source_gives_empty_archive() {
    let scratch = Scratch::new().unwrap();
    let source = scratch.make_dir("empty").unwrap();
    let archive = scratch.join("empty.tar");

    let summary = create_directory_tar(&source, &archive).unwrap();
    assert_eq!(summary.files, 0);

    // Just the two zero blocks of the trailer
    assert!(list_entries(&archive).unwrap().is_empty());
    assert_eq!(fs::metadata(&archive).unwrap().len() % 512, 0);

    let extract_dir = scratch.join("out");
    extract_files(&archive, &extract_dir).unwrap();
    assert!(extract_dir.is_dir());
    assert_eq!(fs::read_dir(&extract_dir).unwrap().count(), 0);
}

#[test]
fn test_pack_rejects_wrong_extension_without_touching_disk() {
    let scratch = Scratch::new().unwrap();
    let source = create_source_tree(&scratch, "source").unwrap();

    let gz_name = scratch.join("out.tar.gz");
    assert!(matches!(
        create_directory_tar(&source, &gz_name),
        Err(Error::InvalidExtension { .. })
    ));
    assert!(!gz_name.exists());

    let tar_name = scratch.join("out.tar");
    assert!(matches!(
        create_directory_tar_gz(&source, &tar_name),
        Err(Error::InvalidExtension { .. })
    ));
    assert!(!tar_name.exists());
}

#[test]
fn test_pack_missing_source() {
    let scratch = Scratch::new().unwrap();
    let result = create_directory_tar(scratch.join("nope"), scratch.join("out.tar"));
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[cfg(unix)]
#[test]
fn test_unusable_nodes_are_skipped_not_fatal() {
    use dirtar_testing::fixtures::create_symlink_structure;

    let scratch = Scratch::new().unwrap();
    let source = create_symlink_structure(&scratch, "links").unwrap();
    let archive = scratch.join("links.tar");

    let mut events = CollectingSink::new();
    let summary =
        create_directory_tar_with(&source, &archive, &PackOptions::default(), &mut events).unwrap();

    // The dangling link is reported, the live one is archived as a copy
    assert_eq!(summary.skipped, 1);
    assert_eq!(events.skipped().len(), 1);
    assert!(events.skipped()[0].ends_with("dangling"));

    let extract_dir = scratch.join("out");
    extract_files(&archive, &extract_dir).unwrap();
    assert_eq!(
        fs::read(extract_dir.join("link_to_file1.txt")).unwrap(),
        b"Original file"
    );
    assert!(!extract_dir.join("dangling").exists());
}

#[cfg(unix)]
#[test]
fn test_symlinks_skipped_when_not_followed() {
    use dirtar_testing::fixtures::create_symlink_structure;

    let scratch = Scratch::new().unwrap();
    let source = create_symlink_structure(&scratch, "links").unwrap();
    let archive = scratch.join("links.tar");

    let options = PackOptions {
        follow_symlinks: false,
        ..Default::default()
    };
    let mut events = CollectingSink::new();
    let summary = create_directory_tar_with(&source, &archive, &options, &mut events).unwrap();

    assert_eq!(summary.files, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(events.archived_files(), vec!["file1.txt"]);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped() {
    let scratch = Scratch::new().unwrap();
    let source = scratch.make_dir("src").unwrap();
    scratch.write_file("src/ok.txt", b"readable").unwrap();
    let locked = scratch.write_file("src/locked.txt", b"secret").unwrap();

    if !scratch.lock_file("src/locked.txt").unwrap() {
        // Privileged users can open the file regardless of its mode
        return;
    }

    let archive = scratch.join("partial.tar");
    let mut events = CollectingSink::new();
    let summary =
        create_directory_tar_with(&source, &archive, &PackOptions::default(), &mut events).unwrap();

    assert_eq!(summary.files, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(events.skipped(), vec![&locked]);

    let names: Vec<String> = list_entries(&archive)
        .unwrap()
        .into_iter()
        .map(|e| e.path.to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["ok.txt"]);
}
