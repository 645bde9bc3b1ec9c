//! Path strings with explicit, opt-in normalization

use std::borrow::Cow;
use std::convert::Infallible;
use std::ffi::OsStr;
use std::ops::{Add, AddAssign};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

const SEPARATOR: char = '/';
const ROOT: &str = "/";

/// A filesystem path held as a plain string.
///
/// The string is stored exactly as given. Equality, ordering and hashing
/// compare that string, so `a/b` and `a/b/` are different paths even though
/// they name the same location. Use [`FsPath::normalized`] to reduce a path
/// to canonical form.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FsPath {
    inner: String,
}

impl FsPath {
    /// Wrap a path string verbatim.
    pub fn new(path: impl Into<String>) -> Self {
        Self { inner: path.into() }
    }

    /// The root path `/`.
    pub fn root() -> Self {
        Self::new(ROOT)
    }

    /// Create a path from a `file:` URL.
    ///
    /// # Panics
    ///
    /// Panics if `url` is not a file URL, or names a file on a remote host.
    /// Passing any other kind of URL is a programming error.
    pub fn from_url(url: &Url) -> Self {
        assert_eq!(
            url.scheme(),
            "file",
            "FsPath::from_url requires a file URL, got {url}"
        );
        let native = url
            .to_file_path()
            .unwrap_or_else(|()| panic!("file URL {url} does not name a local path"));
        Self::from(native.as_path())
    }

    /// Get the raw string.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// True iff the string starts with `/`.
    ///
    /// This is a textual check. It says nothing about drive-letter or UNC
    /// roots on platforms that have them.
    pub fn is_absolute(&self) -> bool {
        self.inner.starts_with(SEPARATOR)
    }

    pub fn is_relative(&self) -> bool {
        !self.is_absolute()
    }

    /// Return the lexically normalized form of this path.
    ///
    /// Repeated separators collapse, `.` segments disappear and `..` removes
    /// the preceding normal segment. A `..` that would climb above the root of
    /// an absolute path is dropped; leading `..` segments of a relative path
    /// are kept. A relative path that reduces to nothing becomes `.`, and the
    /// empty path stays empty. The filesystem is never consulted, so symbolic
    /// links are not resolved.
    pub fn normalized(&self) -> Self {
        if self.inner.is_empty() {
            return self.clone();
        }

        let mut absolute = false;
        let mut segments: Vec<Cow<'_, str>> = Vec::new();
        for component in Path::new(&self.inner).components() {
            match component {
                Component::Prefix(prefix) => {
                    segments.push(prefix.as_os_str().to_string_lossy());
                }
                Component::RootDir => absolute = true,
                Component::CurDir => {}
                Component::ParentDir => {
                    if segments.last().is_some_and(|last| last != "..") {
                        segments.pop();
                    } else if !absolute {
                        segments.push(Cow::Borrowed(".."));
                    }
                }
                Component::Normal(name) => segments.push(name.to_string_lossy()),
            }
        }

        let joined = segments.join("/");
        let inner = match (absolute, joined.is_empty()) {
            (true, _) => format!("{ROOT}{joined}"),
            (false, true) => ".".to_string(),
            (false, false) => joined,
        };
        Self { inner }
    }

    /// Normalize in place.
    pub fn normalize(&mut self) {
        *self = self.normalized();
    }

    /// Resolve this path against `base`.
    ///
    /// Absolute paths are only normalized. Relative paths are appended to
    /// `base` first.
    pub fn absolute_from(&self, base: &FsPath) -> Self {
        if self.is_absolute() {
            self.normalized()
        } else {
            (base + self).normalized()
        }
    }

    /// Split into components, root first for absolute paths.
    ///
    /// Follows `std::path::Path::components`: repeated separators and
    /// interior `.` segments are skipped, a leading `.` is kept, and a
    /// trailing separator does not produce an empty component.
    pub fn components(&self) -> Vec<FsPath> {
        Path::new(&self.inner)
            .components()
            .map(Self::from_component)
            .collect()
    }

    /// The final component; `/` for the root and empty for the empty path.
    pub fn last_component(&self) -> FsPath {
        Path::new(&self.inner)
            .components()
            .next_back()
            .map(Self::from_component)
            .unwrap_or_default()
    }

    /// The final component with its extension removed.
    pub fn last_component_without_extension(&self) -> FsPath {
        match Path::new(&self.inner).file_stem() {
            Some(stem) => Self::from_os_str(stem),
            None => self.last_component(),
        }
    }

    /// The suffix after the last `.` of the final component.
    ///
    /// Empty when there is none. Names that only start with a dot, like
    /// `.bashrc`, have no extension.
    pub fn extension(&self) -> &str {
        Path::new(&self.inner)
            .extension()
            .and_then(OsStr::to_str)
            .unwrap_or("")
    }

    /// Replace (or add) the extension of the final component.
    pub fn with_extension(&self, extension: &str) -> Self {
        Self::from(Path::new(&self.inner).with_extension(extension))
    }

    /// Remove the final component.
    ///
    /// Trailing separators are ignored. The parent of `/` is `/`, and the
    /// parent of a single relative component (or of the empty path) is the
    /// empty path.
    pub fn parent(&self) -> FsPath {
        let trimmed = self.inner.trim_end_matches(SEPARATOR);
        if trimmed.is_empty() {
            return if self.is_absolute() {
                Self::root()
            } else {
                Self::default()
            };
        }

        match trimmed.rfind(SEPARATOR) {
            Some(idx) => {
                let head = trimmed[..idx].trim_end_matches(SEPARATOR);
                if head.is_empty() {
                    Self::root()
                } else {
                    Self::new(head)
                }
            }
            None => Self::default(),
        }
    }

    /// Append `segment` as a path component.
    ///
    /// Exactly one separator ends up at the boundary. A leading `/` on
    /// `segment` does not make the result absolute, unlike
    /// `std::path::Path::join`.
    pub fn join(&self, segment: &str) -> Self {
        if self.inner.is_empty() {
            return Self::new(segment);
        }
        let tail = segment.trim_start_matches(SEPARATOR);
        if tail.is_empty() {
            return self.clone();
        }
        let head = self.inner.trim_end_matches(SEPARATOR);
        Self {
            inner: format!("{head}{SEPARATOR}{tail}"),
        }
    }

    fn from_component(component: Component<'_>) -> Self {
        match component {
            Component::RootDir => Self::root(),
            other => Self::from_os_str(other.as_os_str()),
        }
    }

    fn from_os_str(s: &OsStr) -> Self {
        Self::new(s.to_string_lossy().into_owned())
    }
}

impl Add<&FsPath> for &FsPath {
    type Output = FsPath;

    fn add(self, rhs: &FsPath) -> FsPath {
        self.join(rhs.as_str())
    }
}

impl Add<&FsPath> for FsPath {
    type Output = FsPath;

    fn add(self, rhs: &FsPath) -> FsPath {
        self.join(rhs.as_str())
    }
}

impl Add<FsPath> for FsPath {
    type Output = FsPath;

    fn add(self, rhs: FsPath) -> FsPath {
        self.join(rhs.as_str())
    }
}

impl Add<&str> for &FsPath {
    type Output = FsPath;

    fn add(self, rhs: &str) -> FsPath {
        self.join(rhs)
    }
}

impl Add<&str> for FsPath {
    type Output = FsPath;

    fn add(self, rhs: &str) -> FsPath {
        self.join(rhs)
    }
}

impl AddAssign<&FsPath> for FsPath {
    fn add_assign(&mut self, rhs: &FsPath) {
        *self = self.join(rhs.as_str());
    }
}

impl AddAssign<FsPath> for FsPath {
    fn add_assign(&mut self, rhs: FsPath) {
        *self = self.join(rhs.as_str());
    }
}

impl AddAssign<&str> for FsPath {
    fn add_assign(&mut self, rhs: &str) {
        *self = self.join(rhs);
    }
}

impl AsRef<Path> for FsPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl AsRef<str> for FsPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl std::fmt::Display for FsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl FromStr for FsPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for FsPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FsPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for FsPath {
    fn from(p: PathBuf) -> Self {
        Self::from(p.as_path())
    }
}

impl From<&Path> for FsPath {
    fn from(p: &Path) -> Self {
        Self::new(p.to_string_lossy().into_owned())
    }
}

impl From<&Url> for FsPath {
    fn from(url: &Url) -> Self {
        Self::from_url(url)
    }
}

impl From<FsPath> for String {
    fn from(path: FsPath) -> Self {
        path.inner
    }
}
