//! Development-mode refresh protocol.
//!
//! In development mode an asset's embedded bytes are reconciled with the live
//! file on disk before every read. The live file is located through a
//! [`SearchPath`]: an ordered list of [`SourceResolver`]s where the first one
//! that finds the asset's source-relative path wins.
//!
//! Change detection compares modification times only. A disk file is re-read
//! when its mtime is strictly newer than the recorded one, so two writes
//! within the timestamp granularity coalesce into one.

use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;
use tracing::debug;

/// Shared development-mode switch.
///
/// Clones share one flag. Toggling takes effect on the next operation of
/// every asset and mount holding a clone.
///
/// # Examples
///
/// ```
/// use binfs::DevMode;
///
/// let flag = DevMode::new(false);
/// let shared = flag.clone();
///
/// shared.set(true);
/// assert!(flag.is_enabled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DevMode(Arc<AtomicBool>);

impl DevMode {
    /// Creates a flag with the given initial state.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    /// Returns `true` if development mode is on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Turns development mode on or off.
    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Release);
    }
}

/// A live file or directory found by a resolver.
#[derive(Debug, Clone)]
pub struct Located {
    /// Absolute (or root-joined) path on disk
    pub path: PathBuf,
    /// Metadata captured when the path was resolved
    pub metadata: fs::Metadata,
}

/// Strategy for locating a source-relative path on disk.
pub trait SourceResolver: fmt::Debug + Send + Sync {
    /// Returns the live entry for `relative`, or `None` if this resolver
    /// does not have it.
    fn resolve(&self, relative: &Path) -> Option<Located>;
}

/// Resolves paths by joining them onto a fixed source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDir {
    root: PathBuf,
}

impl RootDir {
    /// Creates a resolver rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceResolver for RootDir {
    fn resolve(&self, relative: &Path) -> Option<Located> {
        let path = self.root.join(relative);
        let metadata = fs::metadata(&path).ok()?;
        Some(Located { path, metadata })
    }
}

/// Ordered list of resolvers consulted in development mode.
///
/// # Examples
///
/// ```
/// use binfs::SearchPath;
///
/// let search = SearchPath::from_roots(["./src", "./vendor"]);
/// assert_eq!(search.len(), 2);
///
/// let err = search.find_file("no/such/file.txt").unwrap_err();
/// assert!(err.is_not_found());
/// ```
#[derive(Debug, Default)]
pub struct SearchPath {
    resolvers: Vec<Box<dyn SourceResolver>>,
}

impl SearchPath {
    /// Creates an empty search path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a search path of [`RootDir`] resolvers, in order.
    #[must_use]
    pub fn from_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        roots
            .into_iter()
            .fold(Self::new(), |search, root| search.with(RootDir::new(root)))
    }

    /// Appends a resolver, consulted after all existing ones.
    #[must_use]
    pub fn with(mut self, resolver: impl SourceResolver + 'static) -> Self {
        self.push(resolver);
        self
    }

    /// Appends a resolver in place.
    pub fn push(&mut self, resolver: impl SourceResolver + 'static) {
        self.resolvers.push(Box::new(resolver));
    }

    /// Number of resolvers.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns `true` if there are no resolvers.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Finds the first regular file at `relative`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no resolver has a file at that path.
    pub fn find_file(&self, relative: impl AsRef<Path>) -> Result<Located> {
        self.find(relative.as_ref(), |located| located.metadata.is_file())
    }

    /// Finds the first directory at `relative`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when no resolver has a directory at that path.
    pub fn find_dir(&self, relative: impl AsRef<Path>) -> Result<Located> {
        self.find(relative.as_ref(), |located| located.metadata.is_dir())
    }

    fn find(&self, relative: &Path, accept: impl Fn(&Located) -> bool) -> Result<Located> {
        self.resolvers
            .iter()
            .filter_map(|resolver| resolver.resolve(relative))
            .find(|located| accept(located))
            .ok_or_else(|| Error::NotFound {
                path: relative.display().to_string(),
            })
    }
}

/// Fresh content read from disk.
#[derive(Debug)]
pub(crate) struct Fresh {
    pub data: Vec<u8>,
    pub mode: u32,
    pub modified: SystemTime,
}

/// Checks the live file for `relative` against the recorded `modified` time.
///
/// Returns `Ok(None)` when the disk file is not newer; nothing is read in
/// that case.
pub(crate) fn probe(
    search: &SearchPath,
    relative: &Path,
    recorded: SystemTime,
) -> Result<Option<Fresh>> {
    let located = search.find_file(relative)?;
    let modified = modified_time(&located.path, &located.metadata)?;

    if modified <= recorded {
        debug!(path = %located.path.display(), "live file unchanged");
        return Ok(None);
    }

    let data = fs::read(&located.path).map_err(|source| Error::Io {
        path: located.path.display().to_string(),
        source,
    })?;

    debug!(
        path = %located.path.display(),
        bytes = data.len(),
        "reloaded live file"
    );

    Ok(Some(Fresh {
        data,
        mode: file_mode(&located.metadata),
        modified,
    }))
}

pub(crate) fn modified_time(path: &Path, metadata: &fs::Metadata) -> Result<SystemTime> {
    metadata.modified().map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Permission bits of a disk entry.
#[cfg(unix)]
pub(crate) fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

/// Permission bits of a disk entry.
#[cfg(not(unix))]
pub(crate) fn file_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_at(path: &Path, content: &str, modified: SystemTime) {
        fs::write(path, content).unwrap();
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(modified).unwrap();
    }

    #[test]
    fn test_dev_mode_clones_share_state() {
        let flag = DevMode::new(false);
        let other = flag.clone();
        other.set(true);
        assert!(flag.is_enabled());
        flag.set(false);
        assert!(!other.is_enabled());
    }

    #[test]
    fn test_dev_mode_default_is_off() {
        assert!(!DevMode::default().is_enabled());
    }

    #[test]
    fn test_search_path_first_root_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(first.path().join("a.txt"), "first").unwrap();
        fs::write(second.path().join("a.txt"), "second").unwrap();

        let search = SearchPath::from_roots([first.path(), second.path()]);
        let located = search.find_file("a.txt").unwrap();
        assert_eq!(located.path, first.path().join("a.txt"));
    }

    #[test]
    fn test_search_path_falls_through_to_later_root() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("b.txt"), "second").unwrap();

        let search = SearchPath::from_roots([first.path(), second.path()]);
        let located = search.find_file("b.txt").unwrap();
        assert_eq!(located.path, second.path().join("b.txt"));
    }

    #[test]
    fn test_search_path_exhausted_is_not_found() {
        let root = TempDir::new().unwrap();
        let search = SearchPath::from_roots([root.path()]);
        assert!(search.find_file("missing.txt").unwrap_err().is_not_found());
        assert!(SearchPath::new().find_dir("any").unwrap_err().is_not_found());
    }

    #[test]
    fn test_search_path_distinguishes_files_and_dirs() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::create_dir(first.path().join("entry")).unwrap();
        fs::write(second.path().join("entry"), "file").unwrap();

        let search = SearchPath::from_roots([first.path(), second.path()]);
        assert_eq!(
            search.find_dir("entry").unwrap().path,
            first.path().join("entry")
        );
        assert_eq!(
            search.find_file("entry").unwrap().path,
            second.path().join("entry")
        );
    }

    #[test]
    fn test_probe_newer_file_is_read() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("page.html");
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000);
        write_at(&path, "fresh", modified);

        let search = SearchPath::from_roots([root.path()]);
        let recorded = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let fresh = probe(&search, Path::new("page.html"), recorded)
            .unwrap()
            .unwrap();

        assert_eq!(fresh.data, b"fresh");
        assert_eq!(fresh.modified, modified);
    }

    #[test]
    fn test_probe_same_time_is_unchanged() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("page.html");
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000);
        write_at(&path, "fresh", modified);

        let search = SearchPath::from_roots([root.path()]);
        assert!(
            probe(&search, Path::new("page.html"), modified)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_probe_older_file_is_unchanged() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("page.html");
        write_at(&path, "old", SystemTime::UNIX_EPOCH + Duration::from_secs(10));

        let search = SearchPath::from_roots([root.path()]);
        let recorded = SystemTime::UNIX_EPOCH + Duration::from_secs(20);
        assert!(
            probe(&search, Path::new("page.html"), recorded)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_probe_missing_file_is_not_found() {
        let root = TempDir::new().unwrap();
        let search = SearchPath::from_roots([root.path()]);
        let err = probe(&search, Path::new("gone.txt"), SystemTime::UNIX_EPOCH).unwrap_err();
        assert!(err.is_not_found());
    }
}
