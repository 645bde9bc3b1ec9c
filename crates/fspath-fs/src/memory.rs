//! In-memory filesystem backend for tests

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{self, Cursor, ErrorKind, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use fspath_core::FsPath;

use crate::attributes::{self, AttributeKey};
use crate::filesystem::{FileSystem, ReadHandle, WriteHandle};
use crate::{Attributes, Error, HandleMode, Result, WellKnownLocation};

/// Resolving a path may follow at most this many symlinks.
const MAX_LINK_DEPTH: usize = 40;

#[derive(Debug, Clone)]
enum Node {
    File {
        data: Vec<u8>,
        modified: DateTime<Utc>,
    },
    Directory {
        modified: DateTime<Utc>,
    },
    Symlink {
        target: FsPath,
    },
}

impl Node {
    fn file(data: Vec<u8>) -> Self {
        Self::File {
            data,
            modified: Utc::now(),
        }
    }

    fn directory() -> Self {
        Self::Directory {
            modified: Utc::now(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::File { .. } => attributes::TYPE_FILE,
            Self::Directory { .. } => attributes::TYPE_DIRECTORY,
            Self::Symlink { .. } => attributes::TYPE_SYMLINK,
        }
    }
}

#[derive(Debug)]
struct State {
    /// Keyed by absolute, normalized path. `/` is always a directory.
    nodes: BTreeMap<FsPath, Node>,
    locations: HashMap<WellKnownLocation, FsPath>,
    read_only: BTreeSet<FsPath>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl State {
    /// Absolute key for `path`, with symlinks in every ancestor component
    /// resolved. The final component is left as is.
    fn key(&self, path: &FsPath) -> FsPath {
        let current = self
            .locations
            .get(&WellKnownLocation::Current)
            .cloned()
            .unwrap_or_else(FsPath::root);
        let mut hops = MAX_LINK_DEPTH;
        self.resolve_ancestors(&path.absolute_from(&current), &mut hops)
    }

    fn resolve_ancestors(&self, key: &FsPath, hops: &mut usize) -> FsPath {
        let components = key.components();
        let Some((last, ancestors)) = components.split_last() else {
            return key.clone();
        };
        let mut resolved = FsPath::root();
        for component in ancestors.iter().skip(1) {
            let next = resolved.join(component.as_str());
            resolved = match self.follow(&next, hops) {
                Some((target, _)) => target,
                None => next,
            };
        }
        resolved.join(last.as_str())
    }

    /// Follow symlinks at the final component.
    fn resolve(&self, key: &FsPath) -> Option<(FsPath, &Node)> {
        let mut hops = MAX_LINK_DEPTH;
        self.follow(key, &mut hops)
    }

    fn follow(&self, key: &FsPath, hops: &mut usize) -> Option<(FsPath, &Node)> {
        let mut key = key.clone();
        loop {
            match self.nodes.get(&key)? {
                Node::Symlink { target } => {
                    *hops = hops.checked_sub(1)?;
                    let target = target.absolute_from(&key.parent());
                    key = self.resolve_ancestors(&target, hops);
                }
                node => return Some((key, node)),
            }
        }
    }

    fn is_dir(&self, key: &FsPath) -> bool {
        matches!(self.resolve(key), Some((_, Node::Directory { .. })))
    }

    /// Keys strictly below `key`, in order.
    fn descendants(&self, key: &FsPath) -> Vec<FsPath> {
        let prefix = if key.as_str() == "/" {
            "/".to_string()
        } else {
            format!("{key}/")
        };
        self.nodes
            .keys()
            .filter(|k| k.as_str().len() > prefix.len() && k.as_str().starts_with(&prefix))
            .cloned()
            .collect()
    }

    fn require_parent_dir(&self, key: &FsPath) -> io::Result<()> {
        match self.nodes.get(&key.parent()) {
            Some(Node::Directory { .. }) => Ok(()),
            Some(_) => Err(ErrorKind::NotADirectory.into()),
            None => Err(ErrorKind::NotFound.into()),
        }
    }

    fn require_writable(&self, key: &FsPath) -> io::Result<()> {
        if self.read_only.contains(key) || self.read_only.contains(&key.parent()) {
            return Err(ErrorKind::PermissionDenied.into());
        }
        Ok(())
    }

    fn create_dir_all(&mut self, key: &FsPath) -> io::Result<()> {
        let mut missing = Vec::new();
        let mut current = key.clone();
        loop {
            match self.nodes.get(&current) {
                Some(Node::Directory { .. }) => break,
                Some(_) => return Err(ErrorKind::NotADirectory.into()),
                None => {
                    let parent = current.parent();
                    missing.push(current);
                    current = parent;
                }
            }
        }
        for dir in missing.into_iter().rev() {
            self.require_writable(&dir)?;
            self.nodes.insert(dir, Node::directory());
        }
        Ok(())
    }

    /// Move `from` and everything below it to `to`.
    fn rebase(&mut self, from: &FsPath, to: &FsPath, keep_source: bool) {
        let mut moved = vec![from.clone()];
        moved.extend(self.descendants(from));
        let from_len = from.as_str().len();
        for key in moved {
            let node = if keep_source {
                self.nodes.get(&key).cloned()
            } else {
                self.nodes.remove(&key)
            };
            if let Some(node) = node {
                let target = FsPath::new(format!("{}{}", to, &key.as_str()[from_len..]));
                self.nodes.insert(target, node);
            }
        }
    }
}

/// [`FileSystem`] that keeps its whole tree in memory.
///
/// Relative paths resolve against the configurable current directory.
/// Symlinks in directory components are always followed; the final
/// component is followed by reads and status queries but replaced by `write`, as a
/// rename over it would. Clones share the same tree.
///
/// # Examples
///
/// ```
/// use fspath_core::FsPath;
/// use fspath_fs::{FileSystem, MemoryFileSystem};
///
/// let fs = MemoryFileSystem::new();
/// let path = FsPath::new("/data/notes.txt");
/// fs.write(&path, b"hello", true).unwrap();
/// assert_eq!(fs.read(&path).unwrap(), b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    /// Create a tree holding `/` and the default well-known directories.
    pub fn new() -> Self {
        let locations = HashMap::from([
            (WellKnownLocation::Current, FsPath::root()),
            (WellKnownLocation::Temporary, FsPath::new("/tmp")),
            (WellKnownLocation::Home, FsPath::new("/home/user")),
            (
                WellKnownLocation::Permanent,
                FsPath::new("/home/user/.local/share"),
            ),
            (WellKnownLocation::Cache, FsPath::new("/home/user/.cache")),
        ]);

        let mut state = State {
            nodes: BTreeMap::from([(FsPath::root(), Node::directory())]),
            locations: HashMap::new(),
            read_only: BTreeSet::new(),
        };
        for dir in locations.values() {
            // Fresh tree with only `/`; nothing can be in the way.
            let _ = state.create_dir_all(dir);
        }
        state.locations = locations;

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Point a well-known location somewhere else, creating the directory.
    pub fn set_location(&self, location: WellKnownLocation, path: &FsPath) -> Result<()> {
        let mut state = lock(&self.state);
        let key = state.key(path);
        state.create_dir_all(&key).map_err(|e| Error::io(path, e))?;
        state.locations.insert(location, key);
        Ok(())
    }

    /// Make a well-known location unresolvable.
    pub fn clear_location(&self, location: WellKnownLocation) {
        lock(&self.state).locations.remove(&location);
    }

    /// Create a symlink at `link` pointing to `target`.
    pub fn symlink(&self, target: &FsPath, link: &FsPath) -> Result<()> {
        let mut state = lock(&self.state);
        let key = state.key(link);
        if state.nodes.contains_key(&key) {
            return Err(Error::io(link, ErrorKind::AlreadyExists.into()));
        }
        state.require_parent_dir(&key).map_err(|e| Error::io(link, e))?;
        state.nodes.insert(
            key,
            Node::Symlink {
                target: target.clone(),
            },
        );
        Ok(())
    }

    /// Reject writes, deletes and moves of `path` and of its direct children.
    ///
    /// Mirrors a directory without write permission.
    pub fn set_read_only(&self, path: &FsPath, read_only: bool) {
        let mut state = lock(&self.state);
        let key = state.key(path);
        if read_only {
            state.read_only.insert(key);
        } else {
            state.read_only.remove(&key);
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn children(&self, path: &FsPath) -> Result<Vec<FsPath>> {
        let state = lock(&self.state);
        let key = state.key(path);
        let Some((dir, node)) = state.resolve(&key) else {
            return Err(Error::io(path, ErrorKind::NotFound.into()));
        };
        if !matches!(node, Node::Directory { .. }) {
            return Err(Error::NotADirectory { path: path.clone() });
        }

        Ok(state
            .descendants(&dir)
            .into_iter()
            .filter(|k| k.parent() == dir)
            .map(|k| path.join(k.last_component().as_str()))
            .collect())
    }

    fn subpaths(&self, path: &FsPath) -> Result<Vec<FsPath>> {
        let state = lock(&self.state);
        let key = state.key(path);
        let Some((dir, node)) = state.resolve(&key) else {
            return Err(Error::io(path, ErrorKind::NotFound.into()));
        };
        if !matches!(node, Node::Directory { .. }) {
            return Err(Error::NotADirectory { path: path.clone() });
        }

        let prefix_len = dir.as_str().trim_end_matches('/').len();
        Ok(state
            .descendants(&dir)
            .into_iter()
            .map(|k| path.join(&k.as_str()[prefix_len..]))
            .collect())
    }

    fn exists(&self, path: &FsPath) -> bool {
        let state = lock(&self.state);
        state.nodes.contains_key(&state.key(path))
    }

    fn is_directory(&self, path: &FsPath) -> bool {
        let state = lock(&self.state);
        state.is_dir(&state.key(path))
    }

    fn is_file(&self, path: &FsPath) -> bool {
        let state = lock(&self.state);
        matches!(state.resolve(&state.key(path)), Some((_, Node::File { .. })))
    }

    fn is_symbolic_link(&self, path: &FsPath) -> bool {
        let state = lock(&self.state);
        matches!(
            state.nodes.get(&state.key(path)),
            Some(Node::Symlink { .. })
        )
    }

    fn create_directory(&self, path: &FsPath, with_intermediates: bool) -> Result<()> {
        let mut state = lock(&self.state);
        let key = state.key(path);
        let result = if with_intermediates {
            state.create_dir_all(&key)
        } else if state.nodes.contains_key(&key) {
            Err(ErrorKind::AlreadyExists.into())
        } else {
            state
                .require_parent_dir(&key)
                .and_then(|()| state.require_writable(&key))
                .map(|()| {
                    state.nodes.insert(key, Node::directory());
                })
        };
        result.map_err(|e| Error::io(path, e))
    }

    fn delete(&self, path: &FsPath, if_exists: bool) -> Result<()> {
        let mut state = lock(&self.state);
        let key = state.key(path);
        if !state.nodes.contains_key(&key) {
            if if_exists {
                return Ok(());
            }
            return Err(Error::io(path, ErrorKind::NotFound.into()));
        }
        if key == FsPath::root() {
            return Err(Error::io(path, ErrorKind::PermissionDenied.into()));
        }
        state
            .require_writable(&key)
            .map_err(|e| Error::io(path, e))?;

        for descendant in state.descendants(&key) {
            state.nodes.remove(&descendant);
        }
        state.nodes.remove(&key);
        Ok(())
    }

    fn copy(&self, from: &FsPath, to: &FsPath) -> Result<()> {
        let mut state = lock(&self.state);
        let source = state.key(from);
        let target = state.key(to);
        if state.nodes.contains_key(&target) {
            return Err(Error::AlreadyExists { path: to.clone() });
        }
        if !state.nodes.contains_key(&source) {
            return Err(Error::io(from, ErrorKind::NotFound.into()));
        }
        if is_within(&target, &source) {
            return Err(Error::io(to, ErrorKind::InvalidInput.into()));
        }
        state
            .require_parent_dir(&target)
            .and_then(|()| state.require_writable(&target))
            .map_err(|e| Error::io(to, e))?;

        state.rebase(&source, &target, true);
        Ok(())
    }

    fn rename(&self, from: &FsPath, to: &FsPath) -> Result<()> {
        let mut state = lock(&self.state);
        let source = state.key(from);
        let target = state.key(to);
        if !state.nodes.contains_key(&source) {
            return Err(Error::io(from, ErrorKind::NotFound.into()));
        }
        if source == target {
            return Ok(());
        }
        if is_within(&target, &source) {
            return Err(Error::io(to, ErrorKind::InvalidInput.into()));
        }
        state
            .require_parent_dir(&target)
            .and_then(|()| state.require_writable(&source))
            .and_then(|()| state.require_writable(&target))
            .map_err(|e| Error::io(to, e))?;

        for descendant in state.descendants(&target) {
            state.nodes.remove(&descendant);
        }
        state.nodes.remove(&target);
        state.rebase(&source, &target, false);
        Ok(())
    }

    fn read(&self, path: &FsPath) -> Result<Vec<u8>> {
        let state = lock(&self.state);
        match state.resolve(&state.key(path)) {
            Some((_, Node::File { data, .. })) => Ok(data.clone()),
            Some(_) => Err(Error::io(path, ErrorKind::IsADirectory.into())),
            None => Err(Error::io(path, ErrorKind::NotFound.into())),
        }
    }

    fn write(&self, path: &FsPath, data: &[u8], create_directory: bool) -> Result<()> {
        let mut state = lock(&self.state);
        let key = state.key(path);
        if create_directory {
            state
                .create_dir_all(&key.parent())
                .map_err(|e| Error::io(&path.parent(), e))?;
        }
        state
            .require_parent_dir(&key)
            .and_then(|()| state.require_writable(&key))
            .map_err(|e| Error::io(path, e))?;
        if matches!(state.nodes.get(&key), Some(Node::Directory { .. })) {
            return Err(Error::io(path, ErrorKind::IsADirectory.into()));
        }

        state.nodes.insert(key, Node::file(data.to_vec()));
        Ok(())
    }

    fn attributes(&self, path: &FsPath) -> Result<Attributes> {
        let state = lock(&self.state);
        let key = state.key(path);
        let node = state
            .nodes
            .get(&key)
            .ok_or_else(|| Error::io(path, ErrorKind::NotFound.into()))?;

        let (size, modified) = match node {
            Node::File { data, modified } => (data.len() as u64, Some(*modified)),
            Node::Directory { modified } => (0, Some(*modified)),
            Node::Symlink { target } => (target.as_str().len() as u64, None),
        };

        let mut result = Attributes::new();
        result.insert(AttributeKey::Type, node.type_name().into());
        result.insert(AttributeKey::Size, size.into());
        result.insert(
            AttributeKey::ReadOnly,
            state.read_only.contains(&key).into(),
        );
        if let Some(modified) = modified {
            result.insert(AttributeKey::ModificationDate, modified.into());
        }
        Ok(result)
    }

    fn open_reading_handle(&self, path: &FsPath) -> Result<Box<dyn ReadHandle>> {
        let data = self
            .read(path)
            .map_err(|e| Error::open(path, HandleMode::Reading, into_io(e)))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn open_writing_handle(&self, path: &FsPath) -> Result<Box<dyn WriteHandle>> {
        let state = lock(&self.state);
        let key = state.key(path);
        let (key, data) = match state.resolve(&key) {
            Some((resolved, Node::File { data, .. })) => (resolved, data.clone()),
            Some(_) => {
                return Err(Error::open(
                    path,
                    HandleMode::Writing,
                    ErrorKind::IsADirectory.into(),
                ));
            }
            None => {
                return Err(Error::open(
                    path,
                    HandleMode::Writing,
                    ErrorKind::NotFound.into(),
                ));
            }
        };
        state
            .require_writable(&key)
            .map_err(|e| Error::open(path, HandleMode::Writing, e))?;

        Ok(Box::new(MemoryWriteHandle {
            key,
            buffer: Cursor::new(data),
            state: Arc::clone(&self.state),
        }))
    }

    fn location(&self, location: WellKnownLocation) -> Result<FsPath> {
        lock(&self.state)
            .locations
            .get(&location)
            .cloned()
            .ok_or(Error::UnknownLocation { location })
    }
}

/// Whether `key` is `ancestor` or lies below it.
fn is_within(key: &FsPath, ancestor: &FsPath) -> bool {
    key == ancestor
        || ancestor.as_str() == "/"
        || key.as_str().starts_with(&format!("{ancestor}/"))
}

fn into_io(error: Error) -> io::Error {
    match error {
        Error::Io { source, .. } | Error::OpenHandle { source, .. } => source,
        other => io::Error::other(other.to_string()),
    }
}

/// Writes land in a private buffer and are published to the tree on
/// `flush` and on drop.
#[derive(Debug)]
struct MemoryWriteHandle {
    key: FsPath,
    buffer: Cursor<Vec<u8>>,
    state: Arc<Mutex<State>>,
}

impl MemoryWriteHandle {
    fn commit(&self) -> io::Result<()> {
        let mut state = lock(&self.state);
        match state.nodes.get_mut(&self.key) {
            Some(Node::File { data, modified }) => {
                data.clone_from(self.buffer.get_ref());
                *modified = Utc::now();
                Ok(())
            }
            _ => Err(ErrorKind::NotFound.into()),
        }
    }
}

impl Write for MemoryWriteHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit()
    }
}

impl Seek for MemoryWriteHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.buffer.seek(pos)
    }
}

impl Drop for MemoryWriteHandle {
    fn drop(&mut self) {
        if let Err(e) = self.commit() {
            tracing::debug!(path = %self.key, error = %e, "Dropped write handle for a removed file");
        }
    }
}
