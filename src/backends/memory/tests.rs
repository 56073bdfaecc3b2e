//! Tests for the in-memory tree engine.

use std::sync::{Arc, Mutex};
use std::thread;

use super::MemoryTree;
use crate::error::ErrorKind;
use crate::types::{PRIVATE, PUBLIC, WalkControl, WriteConfig, WriteFlag};

fn tree() -> MemoryTree {
    MemoryTree::new(PUBLIC)
}

fn walk_paths(tree: &MemoryTree, start: &str, skip: Option<&str>) -> Vec<String> {
    let seen = Mutex::new(Vec::new());
    tree.walk(start, &mut |path, entry, err| {
        assert!(err.is_none());
        seen.lock().unwrap().push(path.to_string());
        if Some(path) == skip && entry.is_dir() {
            return Ok(WalkControl::SkipDir);
        }
        Ok(WalkControl::Continue)
    })
    .unwrap();
    seen.into_inner().unwrap()
}

#[test]
fn test_create_dir_is_idempotent() {
    let fs = tree();
    fs.create_dir("dir1/dir2/dir3/dir4", None).unwrap();
    fs.create_dir("dir1/dir2/dir3/dir4", None).unwrap();
    assert!(fs.dir_exists("dir1/dir2/dir3/dir4"));
    assert_eq!(fs.read_dir("dir1").unwrap().len(), 1);

    fs.delete_dir("dir1/dir2/dir3/dir4").unwrap();
    assert!(!fs.dir_exists("dir1/dir2/dir3/dir4"));
    assert!(fs.dir_exists("dir1/dir2/dir3"));
}

#[test]
fn test_create_dir_with_dot_end() {
    let fs = tree();
    fs.create_dir("dir1/dir2/./", None).unwrap();
    assert!(fs.dir_exists("dir1/dir2"));
}

#[test]
fn test_create_dir_through_file_fails() {
    let fs = tree();
    fs.write("a", b"x", None).unwrap();
    let err = fs.create_dir("a/b", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn test_write_and_read() {
    let fs = tree();
    fs.write("/test.txt", b"Hello, World!", None).unwrap();
    assert_eq!(fs.read("test.txt").unwrap(), b"Hello, World!");
    assert_eq!(fs.visibility("test.txt").unwrap(), PUBLIC);
    assert_eq!(fs.metadata("test.txt").unwrap().size, 13);
}

#[test]
fn test_write_creates_ancestors_with_dir_visibility() {
    let fs = tree();
    let cfg = WriteConfig::public_file_with_private_dir();
    fs.write("dir1/dir2/test.txt", b"hello", Some(&cfg)).unwrap();
    assert_eq!(fs.visibility("dir1").unwrap(), PRIVATE);
    assert_eq!(fs.visibility("dir1/dir2").unwrap(), PRIVATE);
    assert_eq!(fs.visibility("dir1/dir2/test.txt").unwrap(), PUBLIC);
}

#[test]
fn test_append_accumulates() {
    let fs = tree();
    let cfg = WriteConfig::private_file().with_write_flag(WriteFlag::APPEND);
    fs.write("test.txt", b"hello", Some(&cfg)).unwrap();
    fs.write("test.txt", b" world", Some(&cfg)).unwrap();
    assert_eq!(fs.read("test.txt").unwrap(), b"hello world");
    assert_eq!(fs.visibility("test.txt").unwrap(), PRIVATE);
}

#[test]
fn test_truncate_replaces() {
    let fs = tree();
    fs.write("p", b"A", None).unwrap();
    let cfg = WriteConfig::default().with_write_flag(WriteFlag::TRUNCATE);
    fs.write("p", b"B", Some(&cfg)).unwrap();
    assert_eq!(fs.read("p").unwrap(), b"B");
}

#[test]
fn test_write_updates_mtime() {
    let fs = tree();
    fs.write("f", b"1", None).unwrap();
    let before = fs.metadata("f").unwrap().modified;
    thread::sleep(std::time::Duration::from_millis(5));
    fs.write("f", b"2", None).unwrap();
    assert!(fs.metadata("f").unwrap().modified > before);
}

#[test]
fn test_write_to_root_is_noop() {
    let fs = tree();
    fs.write("/", b"ignored", None).unwrap();
    fs.write("", b"ignored", None).unwrap();
    assert!(fs.read_dir("").unwrap().is_empty());
}

#[test]
fn test_write_onto_directory_fails() {
    let fs = tree();
    fs.create_dir("dir", None).unwrap();
    let err = fs.write("dir", b"x", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAFile);
}

#[test]
fn test_exists_never_errors() {
    let fs = tree();
    assert!(!fs.exists("nope/deeper"));
    fs.write("test.txt", b"hello", None).unwrap();
    assert!(fs.exists("test.txt"));
    assert!(fs.file_exists("test.txt"));
    assert!(!fs.dir_exists("test.txt"));
    assert!(fs.dir_exists("/"));
    assert!(!fs.exists("test.txt/child"));
}

#[test]
fn test_read_errors() {
    let fs = tree();
    assert_eq!(fs.read("missing").unwrap_err().kind(), ErrorKind::NotFound);
    fs.create_dir("dir", None).unwrap();
    assert_eq!(fs.read("dir").unwrap_err().kind(), ErrorKind::NotAFile);
}

#[test]
fn test_read_dir_is_sorted() {
    let fs = tree();
    for name in ["zeta", "alpha", "Beta", "mid/inner", "_under"] {
        fs.write(name, b"", None).unwrap();
    }
    let names: Vec<_> = fs.read_dir("").unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["Beta", "_under", "alpha", "mid", "zeta"]);

    let mid = &fs.read_dir("").unwrap()[3];
    assert!(mid.is_dir());
    assert_eq!(mid.size, 0);
}

#[test]
fn test_read_dir_errors() {
    let fs = tree();
    assert_eq!(fs.read_dir("missing").unwrap_err().kind(), ErrorKind::NotFound);
    fs.write("file", b"x", None).unwrap();
    assert_eq!(fs.read_dir("file").unwrap_err().kind(), ErrorKind::NotADirectory);
}

#[test]
fn test_walk_pre_order() {
    let fs = tree();
    fs.write("dir1/a.txt", b"a", None).unwrap();
    fs.write("dir1/dir2/b.txt", b"b", None).unwrap();

    let all = walk_paths(&fs, "dir1", None);
    assert_eq!(all, vec!["dir1", "dir1/a.txt", "dir1/dir2", "dir1/dir2/b.txt"]);

    let skipped = walk_paths(&fs, "dir1", Some("dir1/dir2"));
    assert_eq!(skipped, vec!["dir1", "dir1/a.txt", "dir1/dir2"]);
}

#[test]
fn test_walk_paths_share_one_prefix() {
    let fs = tree();
    fs.write("dir1/a.txt", b"a", None).unwrap();
    fs.write("dir1/dir2/b.txt", b"b", None).unwrap();

    let expected = vec!["dir1", "dir1/a.txt", "dir1/dir2", "dir1/dir2/b.txt"];
    assert_eq!(walk_paths(&fs, "/dir1", None), expected);
    assert_eq!(walk_paths(&fs, "./dir1/", None), expected);
    assert_eq!(walk_paths(&fs, "/", None)[..2], ["", "dir1"]);
}

#[test]
fn test_walk_skip_all_and_errors() {
    let fs = tree();
    fs.write("d/a", b"", None).unwrap();
    fs.write("d/b", b"", None).unwrap();

    let mut count = 0;
    fs.walk("d", &mut |_, _, _| {
        count += 1;
        Ok(if count == 2 { WalkControl::SkipAll } else { WalkControl::Continue })
    })
    .unwrap();
    assert_eq!(count, 2);

    let err = fs
        .walk("d", &mut |path, _, _| {
            if path == "d/b" {
                Err(crate::FsError::PermissionDenied)
            } else {
                Ok(WalkControl::Continue)
            }
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[test]
fn test_walk_missing_path_visits_nothing() {
    let fs = tree();
    assert!(walk_paths(&fs, "nowhere", None).is_empty());
}

#[test]
fn test_visibility_round_trip() {
    let fs = MemoryTree::new(PRIVATE);
    fs.write("f", b"", None).unwrap();
    assert_eq!(fs.visibility("f").unwrap(), PRIVATE);
    fs.set_visibility("f", PUBLIC).unwrap();
    assert_eq!(fs.visibility("f").unwrap(), PUBLIC);
    assert_eq!(
        fs.set_visibility("missing", PUBLIC).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_delete() {
    let fs = tree();
    fs.delete("nonexistent").unwrap();
    fs.write("dir/file", b"x", None).unwrap();
    assert_eq!(fs.delete("dir").unwrap_err().kind(), ErrorKind::NotAFile);
    assert_eq!(fs.delete("/").unwrap_err().kind(), ErrorKind::NotAFile);
    fs.delete("dir/file").unwrap();
    assert!(!fs.exists("dir/file"));
    assert!(fs.dir_exists("dir"));
}

#[test]
fn test_delete_dir() {
    let fs = tree();
    fs.delete_dir("nonexistent").unwrap();
    fs.write("dir/sub/file", b"x", None).unwrap();
    assert_eq!(
        fs.delete_dir("dir/sub/file").unwrap_err().kind(),
        ErrorKind::NotADirectory
    );
    fs.delete_dir("dir").unwrap();
    assert!(!fs.exists("dir"));
    assert!(!fs.exists("dir/sub/file"));
}

#[test]
fn test_delete_root_clears_children() {
    let fs = tree();
    fs.write("a/b", b"x", None).unwrap();
    fs.write("c", b"x", None).unwrap();
    fs.delete_dir("/").unwrap();
    assert!(fs.dir_exists(""));
    assert!(fs.read_dir("").unwrap().is_empty());
    fs.write("again", b"y", None).unwrap();
    assert_eq!(fs.read("again").unwrap(), b"y");
}

#[test]
fn test_move_file() {
    let fs = tree();
    fs.write("src.txt", b"payload", None).unwrap();
    fs.move_to("src.txt", "nested/dir/dst.txt", None).unwrap();
    assert!(!fs.exists("src.txt"));
    assert_eq!(fs.read("nested/dir/dst.txt").unwrap(), b"payload");
    assert_eq!(fs.read_dir("nested/dir").unwrap()[0].name, "dst.txt");
}

#[test]
fn test_move_directory() {
    let fs = tree();
    fs.write("a/x/file", b"1", None).unwrap();
    fs.move_to("a/x", "b/y", None).unwrap();
    assert!(!fs.exists("a/x"));
    assert!(fs.dir_exists("a"));
    assert_eq!(fs.read("b/y/file").unwrap(), b"1");
}

#[test]
fn test_move_onto_existing_fails() {
    let fs = tree();
    fs.write("src", b"s", None).unwrap();
    fs.write("dst", b"d", None).unwrap();
    let err = fs.move_to("src", "dst", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(fs.read("src").unwrap(), b"s");
    assert_eq!(fs.read("dst").unwrap(), b"d");
}

#[test]
fn test_move_guards() {
    let fs = tree();
    assert_eq!(fs.move_to("missing", "x", None).unwrap_err().kind(), ErrorKind::NotFound);
    fs.create_dir("a", None).unwrap();
    assert_eq!(fs.move_to("a", "a/b", None).unwrap_err().kind(), ErrorKind::InvalidPath);
    assert_eq!(fs.move_to("/", "x", None).unwrap_err().kind(), ErrorKind::InvalidPath);
    assert!(fs.dir_exists("a"));
}

#[test]
fn test_copy() {
    let fs = tree();
    fs.write("src", b"content", None).unwrap();
    let cfg = WriteConfig::private_file();
    fs.copy("src", "copies/dst", Some(&cfg)).unwrap();
    assert_eq!(fs.read("copies/dst").unwrap(), b"content");
    assert_eq!(fs.read("src").unwrap(), b"content");
    assert_eq!(fs.visibility("copies/dst").unwrap(), PRIVATE);
    assert_eq!(
        fs.metadata("copies/dst").unwrap().modified,
        fs.metadata("src").unwrap().modified
    );

    // the copy is independent of its source
    fs.write("src", b"changed", None).unwrap();
    assert_eq!(fs.read("copies/dst").unwrap(), b"content");
}

#[test]
fn test_copy_guards() {
    let fs = tree();
    assert_eq!(fs.copy("missing", "x", None).unwrap_err().kind(), ErrorKind::NotFound);
    fs.create_dir("dir", None).unwrap();
    assert_eq!(fs.copy("dir", "x", None).unwrap_err().kind(), ErrorKind::NotAFile);

    fs.write("src", b"new", None).unwrap();
    fs.write("dst", b"old", None).unwrap();
    assert_eq!(fs.copy("src", "dst", None).unwrap_err().kind(), ErrorKind::AlreadyExists);

    let truncate = WriteConfig::default().with_write_flag(WriteFlag::TRUNCATE);
    assert_eq!(
        fs.copy("src", "dir", Some(&truncate)).unwrap_err().kind(),
        ErrorKind::NotAFile
    );
    fs.copy("src", "dst", Some(&truncate)).unwrap();
    assert_eq!(fs.read("dst").unwrap(), b"new");
}

#[test]
fn test_copy_never_appends() {
    // unlike write, copy builds a fresh node even when APPEND is requested
    let fs = tree();
    fs.write("src", b"new", None).unwrap();
    fs.write("dst", b"old", None).unwrap();
    let cfg = WriteConfig::default().with_write_flag(WriteFlag::TRUNCATE | WriteFlag::APPEND);
    fs.copy("src", "dst", Some(&cfg)).unwrap();
    assert_eq!(fs.read("dst").unwrap(), b"new");

    let append_only = WriteConfig::default().with_write_flag(WriteFlag::APPEND);
    assert_eq!(
        fs.copy("src", "dst", Some(&append_only)).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
}

#[test]
fn test_concurrent_independent_writers() {
    let fs = Arc::new(tree());
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let fs = fs.clone();
            thread::spawn(move || {
                for j in 0..50 {
                    let path = format!("shared/w{i}/f{j}");
                    fs.write(&path, path.as_bytes(), None).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(fs.read_dir("shared").unwrap().len(), 16);
    for i in 0..16 {
        assert_eq!(fs.read_dir(&format!("shared/w{i}")).unwrap().len(), 50);
        for j in 0..50 {
            let path = format!("shared/w{i}/f{j}");
            assert_eq!(fs.read(&path).unwrap(), path.as_bytes());
        }
    }
}

#[test]
fn test_concurrent_appends_to_one_file() {
    let fs = Arc::new(tree());
    let cfg = WriteConfig::default().with_write_flag(WriteFlag::APPEND);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let fs = fs.clone();
            let cfg = cfg.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    fs.write("log", b"x", Some(&cfg)).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(fs.read("log").unwrap().len(), 800);
}
