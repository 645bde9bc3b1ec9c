//! Behavioural contract shared by every `FileSystem` backend
//!
//! Each test runs once against the host filesystem (inside a tempdir) and
//! once against the in-memory backend. Both must agree.

use fspath_core::FsPath;
use fspath_fs::{
    AttributeKey, AttributeValue, Error, FileSystem, LocalFileSystem, MemoryFileSystem,
    MoveOptions,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::{Read, Seek, SeekFrom, Write};
use tempfile::TempDir;

struct Sandbox {
    fs: Box<dyn FileSystem>,
    root: FsPath,
    /// Shares the tree behind `fs` when the sandbox is in memory.
    #[cfg_attr(not(unix), allow(dead_code))]
    memory: Option<MemoryFileSystem>,
    _temp: Option<TempDir>,
}

impl Sandbox {
    fn path(&self, relative: &str) -> FsPath {
        self.root.join(relative)
    }

    fn put(&self, relative: &str, content: &str) -> FsPath {
        let path = self.path(relative);
        self.fs.write(&path, content.as_bytes(), true).unwrap();
        path
    }

    #[cfg(unix)]
    fn symlink(&self, target: &FsPath, link: &FsPath) {
        match &self.memory {
            Some(memory) => memory.symlink(target, link).unwrap(),
            None => std::os::unix::fs::symlink(target.to_native(), link.to_native()).unwrap(),
        }
    }
}

fn local() -> Sandbox {
    fspath_fs::logging::init();
    let temp = TempDir::new().unwrap();
    Sandbox {
        fs: Box::new(LocalFileSystem::new()),
        root: FsPath::from(temp.path()),
        memory: None,
        _temp: Some(temp),
    }
}

fn memory() -> Sandbox {
    fspath_fs::logging::init();
    let fs = MemoryFileSystem::new();
    let root = FsPath::new("/sandbox");
    fs.create_directory(&root, false).unwrap();
    Sandbox {
        fs: Box::new(fs.clone()),
        root,
        memory: Some(fs),
        _temp: None,
    }
}

#[rstest]
fn write_then_read_is_byte_exact(#[values(local(), memory())] sandbox: Sandbox) {
    let path = sandbox.path("data.bin");
    let data: Vec<u8> = (0..=255u8).rev().collect();

    sandbox.fs.write(&path, &data, false).unwrap();

    assert_eq!(sandbox.fs.read(&path).unwrap(), data);
}

#[rstest]
fn write_requires_parent_unless_asked(#[values(local(), memory())] sandbox: Sandbox) {
    let path = sandbox.path("nested/dir/file.txt");

    assert!(sandbox.fs.write(&path, b"x", false).is_err());
    assert!(!sandbox.fs.exists(&path.parent()));

    sandbox.fs.write(&path, b"x", true).unwrap();
    assert!(sandbox.fs.is_directory(&path.parent()));
}

#[rstest]
fn delete_if_exists_on_missing_path_succeeds(#[values(local(), memory())] sandbox: Sandbox) {
    let before = sandbox.fs.subpaths(&sandbox.root).unwrap();

    sandbox.fs.delete(&sandbox.path("missing"), true).unwrap();

    assert_eq!(sandbox.fs.subpaths(&sandbox.root).unwrap(), before);
    assert!(sandbox.fs.delete(&sandbox.path("missing"), false).is_err());
}

#[rstest]
fn delete_removes_directories_recursively(#[values(local(), memory())] sandbox: Sandbox) {
    sandbox.put("tree/a/b.txt", "b");
    sandbox.put("tree/c.txt", "c");

    sandbox.fs.delete(&sandbox.path("tree"), false).unwrap();

    assert!(!sandbox.fs.exists(&sandbox.path("tree")));
    assert!(!sandbox.fs.exists(&sandbox.path("tree/a/b.txt")));
}

#[rstest]
fn copy_matches_source_and_keeps_it(#[values(local(), memory())] sandbox: Sandbox) {
    let source = sandbox.put("src.txt", "payload");
    let destination = sandbox.path("dst.txt");

    sandbox.fs.copy(&source, &destination).unwrap();

    assert_eq!(
        sandbox.fs.read(&destination).unwrap(),
        sandbox.fs.read(&source).unwrap()
    );
    assert_eq!(sandbox.fs.read_string(&source).unwrap(), "payload");
}

#[rstest]
fn copy_directory_tree(#[values(local(), memory())] sandbox: Sandbox) {
    sandbox.put("src/one.txt", "1");
    sandbox.put("src/nested/two.txt", "2");

    sandbox
        .fs
        .copy(&sandbox.path("src"), &sandbox.path("dst"))
        .unwrap();

    assert_eq!(
        sandbox.fs.read_string(&sandbox.path("dst/nested/two.txt")).unwrap(),
        "2"
    );
    assert!(sandbox.fs.exists(&sandbox.path("src/one.txt")));
}

#[rstest]
fn copy_refuses_existing_destination(#[values(local(), memory())] sandbox: Sandbox) {
    let source = sandbox.put("a.txt", "a");
    let destination = sandbox.put("b.txt", "b");

    let err = sandbox.fs.copy(&source, &destination).unwrap_err();

    assert!(matches!(err, Error::AlreadyExists { .. }));
    assert_eq!(sandbox.fs.read_string(&destination).unwrap(), "b");
}

#[rstest]
fn copy_directory_into_itself_fails(#[values(local(), memory())] sandbox: Sandbox) {
    sandbox.put("tree/leaf.txt", "x");
    let nested = sandbox.path("tree/copy");

    assert!(sandbox.fs.copy(&sandbox.path("tree"), &nested).is_err());

    assert!(!sandbox.fs.exists(&nested));
    assert_eq!(
        sandbox.fs.subpaths(&sandbox.path("tree")).unwrap(),
        vec![sandbox.path("tree/leaf.txt")]
    );
}

#[rstest]
fn move_over_existing_with_delete_destination(#[values(local(), memory())] sandbox: Sandbox) {
    let source = sandbox.put("incoming.txt", "moved");
    let destination = sandbox.put("target.txt", "previous");

    sandbox
        .fs
        .move_to(
            &source,
            &destination,
            MoveOptions::new().delete_destination(true),
        )
        .unwrap();

    assert_eq!(sandbox.fs.read_string(&destination).unwrap(), "moved");
    assert!(!sandbox.fs.exists(&source));
}

#[rstest]
fn move_refuses_existing_destination(#[values(local(), memory())] sandbox: Sandbox) {
    let source = sandbox.put("incoming.txt", "moved");
    let destination = sandbox.put("target.txt", "previous");

    let err = sandbox
        .fs
        .move_to(&source, &destination, MoveOptions::new())
        .unwrap_err();

    assert!(matches!(err, Error::AlreadyExists { .. }));
    assert!(sandbox.fs.exists(&source));
}

#[rstest]
fn move_creates_parent_when_asked(#[values(local(), memory())] sandbox: Sandbox) {
    let source = sandbox.put("file.txt", "content");
    let destination = sandbox.path("archive/2024/file.txt");

    assert!(
        sandbox
            .fs
            .move_to(&source, &destination, MoveOptions::new())
            .is_err()
    );

    sandbox
        .fs
        .move_to(
            &source,
            &destination,
            MoveOptions::new().create_directory(true),
        )
        .unwrap();

    assert_eq!(sandbox.fs.read_string(&destination).unwrap(), "content");
}

#[rstest]
fn create_directory_semantics(#[values(local(), memory())] sandbox: Sandbox) {
    let deep = sandbox.path("a/b/c");
    assert!(sandbox.fs.create_directory(&deep, false).is_err());

    sandbox.fs.create_directory(&deep, true).unwrap();
    sandbox.fs.create_directory(&deep, true).unwrap();
    assert!(sandbox.fs.create_directory(&deep, false).is_err());

    let file = sandbox.put("file", "x");
    assert!(sandbox.fs.create_directory(&file, true).is_err());
}

#[rstest]
fn listing_shallow_and_recursive(#[values(local(), memory())] sandbox: Sandbox) {
    sandbox.put("b.txt", "");
    sandbox.put("a/inner.txt", "");

    assert_eq!(
        sandbox.fs.children(&sandbox.root).unwrap(),
        vec![sandbox.path("a"), sandbox.path("b.txt")]
    );
    assert_eq!(
        sandbox.fs.subpaths(&sandbox.root).unwrap(),
        vec![
            sandbox.path("a"),
            sandbox.path("a/inner.txt"),
            sandbox.path("b.txt")
        ]
    );

    let err = sandbox.fs.children(&sandbox.path("b.txt")).unwrap_err();
    assert!(matches!(err, Error::NotADirectory { .. }));
}

#[rstest]
fn status_queries(#[values(local(), memory())] sandbox: Sandbox) {
    let file = sandbox.put("file.txt", "x");

    assert!(sandbox.fs.exists(&file));
    assert!(sandbox.fs.is_file(&file));
    assert!(!sandbox.fs.is_directory(&file));
    assert!(!sandbox.fs.is_symbolic_link(&file));

    assert!(sandbox.fs.is_directory(&sandbox.root));
    assert!(!sandbox.fs.is_symbolic_link(&sandbox.root));
    assert!(!sandbox.fs.exists(&sandbox.path("nope")));
}

#[cfg(unix)]
#[rstest]
fn children_of_symlinked_directory_are_readable(#[values(local(), memory())] sandbox: Sandbox) {
    sandbox.put("real/file.txt", "inside");
    let alias = sandbox.path("alias");
    sandbox.symlink(&sandbox.path("real"), &alias);

    let children = sandbox.fs.children(&alias).unwrap();

    assert_eq!(children, vec![alias.join("file.txt")]);
    for child in &children {
        assert!(sandbox.fs.is_file(child));
        assert_eq!(sandbox.fs.read_string(child).unwrap(), "inside");
    }
    sandbox.fs.write(&alias.join("added.txt"), b"via alias", false).unwrap();
    assert_eq!(
        sandbox.fs.read_string(&sandbox.path("real/added.txt")).unwrap(),
        "via alias"
    );
}

#[cfg(unix)]
#[rstest]
fn write_replaces_symlink_and_keeps_target(#[values(local(), memory())] sandbox: Sandbox) {
    let target = sandbox.put("target.txt", "old");
    let link = sandbox.path("link.txt");
    sandbox.symlink(&target, &link);

    sandbox.fs.write(&link, b"new", false).unwrap();

    assert!(!sandbox.fs.is_symbolic_link(&link));
    assert_eq!(sandbox.fs.read_string(&link).unwrap(), "new");
    assert_eq!(sandbox.fs.read_string(&target).unwrap(), "old");
}

#[rstest]
fn write_over_directory_fails_and_keeps_it(#[values(local(), memory())] sandbox: Sandbox) {
    let kept = sandbox.put("occupied/kept.txt", "kept");
    let dir = sandbox.path("occupied");

    assert!(sandbox.fs.write(&dir, b"payload", false).is_err());

    assert!(sandbox.fs.is_directory(&dir));
    assert_eq!(sandbox.fs.read_string(&kept).unwrap(), "kept");
    assert_eq!(sandbox.fs.children(&sandbox.root).unwrap(), vec![dir]);
}

#[rstest]
fn attributes_report_type_and_size(#[values(local(), memory())] sandbox: Sandbox) {
    let file = sandbox.put("sized.txt", "12345");

    let attributes = sandbox.fs.attributes(&file).unwrap();

    assert_eq!(
        attributes.get(&AttributeKey::Size),
        Some(&AttributeValue::Integer(5))
    );
    assert_eq!(
        attributes
            .get(&AttributeKey::Type)
            .and_then(AttributeValue::as_str),
        Some("file")
    );
    assert!(
        attributes
            .get(&AttributeKey::ModificationDate)
            .and_then(AttributeValue::as_timestamp)
            .is_some()
    );
    assert!(sandbox.fs.attributes(&sandbox.path("nope")).is_err());
}

#[rstest]
fn handles_round_trip(#[values(local(), memory())] sandbox: Sandbox) {
    let path = sandbox.put("log.txt", "0123456789");

    {
        let mut writer = sandbox.fs.open_writing_handle(&path).unwrap();
        writer.seek(SeekFrom::End(-3)).unwrap();
        writer.write_all(b"abc").unwrap();
        writer.flush().unwrap();
    }

    let mut reader = sandbox.fs.open_reading_handle(&path).unwrap();
    let mut content = String::new();
    reader.read_to_string(&mut content).unwrap();
    assert_eq!(content, "0123456abc");

    let missing = sandbox.path("missing.txt");
    let err = match sandbox.fs.open_reading_handle(&missing) {
        Ok(_) => panic!("missing file opened"),
        Err(e) => e,
    };
    assert!(err.to_string().contains(missing.as_str()));
}

#[rstest]
fn well_known_locations_resolve(#[values(local(), memory())] sandbox: Sandbox) {
    let current = sandbox.fs.current_dir().unwrap();
    assert!(current.is_absolute());
    assert!(sandbox.fs.is_directory(&sandbox.fs.temporary_dir().unwrap()));

    let relative = FsPath::new("x/../y");
    assert_eq!(
        sandbox.fs.absolute(&relative).unwrap(),
        current.join("y").normalized()
    );
}
