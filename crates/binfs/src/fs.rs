//! The file-serving contract and the asset-tree adapter.
//!
//! [`FileSystem`] and [`File`] are what the HTTP layer consumes. [`AssetFs`]
//! implements them over a [`Directory`] tree by flattening it into a map from
//! virtual path to asset. [`mount`] picks between that and a [`DiskDir`] over
//! the live directory, depending on the runtime's mode.
//!
//! # Examples
//!
//! ```
//! use binfs::{Asset, AssetFs, Directory, FileSystem, Runtime};
//! use std::time::SystemTime;
//!
//! let root = Directory::builder("static", "static")
//!     .asset(Asset::new("file.txt", "static/file.txt", b"file".to_vec(), 0o644, SystemTime::UNIX_EPOCH))
//!     .directory(
//!         Directory::builder("dir", "static/dir")
//!             .asset(Asset::new("file2.txt", "static/dir/file2.txt", b"def".to_vec(), 0o644, SystemTime::UNIX_EPOCH))
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let fs = AssetFs::new(&root, &Runtime::production());
//! assert_eq!(fs.paths(), vec!["/dir/file2.txt", "/file.txt"]);
//! assert!(fs.open("/missing.txt").unwrap_err().is_not_found());
//! # Ok::<(), binfs::Error>(())
//! ```

use crate::asset::{Asset, Content};
use crate::config::Runtime;
use crate::directory::Directory;
use crate::disk::DiskDir;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::io::SeekFrom;
use std::time::SystemTime;
use tracing::debug;

/// File metadata capability shared by assets and disk entries.
pub trait FileInfo {
    /// Base file name.
    fn name(&self) -> &str;
    /// Content length in bytes.
    fn size(&self) -> u64;
    /// Permission bits.
    fn mode(&self) -> u32;
    /// Last modification time.
    fn modified(&self) -> SystemTime;
    /// Returns `true` for directories.
    fn is_dir(&self) -> bool;
}

/// Owned metadata returned by [`File::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Base file name
    pub name: String,
    /// Content length in bytes
    pub size: u64,
    /// Permission bits
    pub mode: u32,
    /// Last modification time
    pub modified: SystemTime,
    /// Whether this is a directory
    pub is_dir: bool,
}

impl Metadata {
    /// Captures the metadata of anything implementing [`FileInfo`].
    #[must_use]
    pub fn of(info: &impl FileInfo) -> Self {
        Self {
            name: info.name().to_string(),
            size: info.size(),
            mode: info.mode(),
            modified: info.modified(),
            is_dir: info.is_dir(),
        }
    }
}

impl FileInfo for Metadata {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mode(&self) -> u32 {
        self.mode
    }

    fn modified(&self) -> SystemTime {
        self.modified
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// A hierarchical, read-only source of files.
pub trait FileSystem: fmt::Debug + Send + Sync {
    /// Opens the file at a `/`-rooted virtual path.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if nothing exists at `path`.
    fn open(&self, path: &str) -> Result<Box<dyn File + '_>>;
}

impl<T: FileSystem + ?Sized> FileSystem for Box<T> {
    fn open(&self, path: &str) -> Result<Box<dyn File + '_>> {
        (**self).open(path)
    }
}

/// An open file with a cursor.
pub trait File: fmt::Debug + Send {
    /// Reads from the cursor into `buf`, advancing the cursor.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` once the cursor is at or past the end.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Moves the cursor and returns its new position.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadOffset` if the new position cannot be represented.
    fn seek(&mut self, pos: SeekFrom) -> Result<i64>;

    /// Returns the file's metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be read.
    fn stat(&self) -> Result<Metadata>;

    /// Lists directory entries.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotADirectory` when listing is not supported.
    fn read_dir(&self) -> Result<Vec<Metadata>>;
}

/// Mounts a directory tree according to the runtime's mode.
///
/// In production this returns an [`AssetFs`] over the embedded tree. In
/// development mode the tree is bypassed: the search path is consulted for
/// the directory's source path and the first match is served from disk.
///
/// # Errors
///
/// Returns `Error::NotFound` in development mode when no search root has the
/// directory.
pub fn mount<'a>(root: &'a Directory, runtime: &Runtime) -> Result<Box<dyn FileSystem + 'a>> {
    if runtime.is_dev_mode() {
        let located = runtime.search_path().find_dir(root.source_path())?;
        debug!(
            directory = %root.name(),
            path = %located.path.display(),
            "mounting live directory"
        );
        return Ok(Box::new(DiskDir::new(located.path)));
    }

    let fs = AssetFs::new(root, runtime);
    debug!(
        directory = %root.name(),
        files = fs.file_count(),
        "mounting embedded assets"
    );
    Ok(Box::new(fs))
}

/// A [`FileSystem`] over an asset tree.
///
/// Built once by a depth-first traversal; the path map never changes.
#[derive(Debug)]
pub struct AssetFs<'a> {
    files: HashMap<String, &'a Asset>,
    runtime: Runtime,
}

impl<'a> AssetFs<'a> {
    /// Flattens `root` into a path map rooted at `/`.
    #[must_use]
    pub fn new(root: &'a Directory, runtime: &Runtime) -> Self {
        let mut fs = Self {
            files: HashMap::with_capacity(root.asset_count()),
            runtime: runtime.clone(),
        };
        fs.append_dir("/", root);
        fs
    }

    fn append_dir(&mut self, base: &str, dir: &'a Directory) {
        for asset in dir.assets() {
            let previous = self.files.insert(format!("{base}{}", asset.name()), asset);
            // entry names are validated single segments, so keys never collide
            debug_assert!(previous.is_none(), "asset path mapped twice");
        }
        for child in dir.directories() {
            self.append_dir(&format!("{base}{}/", child.name()), child);
        }
    }

    /// Looks up an asset by exact virtual path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&'a Asset> {
        self.files.get(path).copied()
    }

    /// Number of mapped assets.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// All mapped paths, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.files.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl FileSystem for AssetFs<'_> {
    fn open(&self, path: &str) -> Result<Box<dyn File + '_>> {
        let asset = self.get(path).ok_or_else(|| Error::NotFound {
            path: path.to_string(),
        })?;
        let content = asset.content(&self.runtime)?;
        Ok(Box::new(AssetFile::new(asset, content)))
    }
}

/// An open asset with a cursor.
///
/// The content snapshot is captured at open time, so a concurrent refresh
/// never shifts bytes under an in-progress read.
#[derive(Debug)]
pub struct AssetFile<'a> {
    asset: &'a Asset,
    content: Content,
    offset: i64,
}

impl<'a> AssetFile<'a> {
    /// Opens `asset` over an already-fetched content snapshot.
    #[must_use]
    pub const fn new(asset: &'a Asset, content: Content) -> Self {
        Self {
            asset,
            content,
            offset: 0,
        }
    }

    /// Current cursor position.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    fn exhausted(&self) -> Error {
        Error::InvalidState {
            path: self.asset.name().to_string(),
            offset: self.offset,
            size: self.content.len(),
        }
    }
}

impl File for AssetFile<'_> {
    /// Reads from the cursor.
    ///
    /// A cursor at or past the end, or one moved before the start by
    /// `seek`, reports `Error::InvalidState`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let bytes = self.content.bytes();
        let start = match usize::try_from(self.offset) {
            Ok(start) if start < bytes.len() => start,
            _ => return Err(self.exhausted()),
        };

        let available = &bytes[start..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        let advanced = i64::try_from(n).map_err(|_| self.exhausted())?;
        self.offset += advanced;
        Ok(n)
    }

    /// Moves the cursor without clamping.
    ///
    /// Positions past the end or before the start are accepted; the next
    /// read then reports `Error::InvalidState`. Only arithmetic overflow is
    /// rejected, with `Error::BadOffset`.
    fn seek(&mut self, pos: SeekFrom) -> Result<i64> {
        let size = self.content.len();
        let overflow = || Error::BadOffset {
            path: self.asset.name().to_string(),
            offset: match pos {
                SeekFrom::Start(n) => n,
                SeekFrom::Current(n) | SeekFrom::End(n) => n.unsigned_abs(),
            },
            size,
        };

        let next = match pos {
            SeekFrom::Start(n) => i64::try_from(n).ok(),
            SeekFrom::Current(delta) => self.offset.checked_add(delta),
            SeekFrom::End(delta) => i64::try_from(size)
                .ok()
                .and_then(|end| end.checked_add(delta)),
        }
        .ok_or_else(overflow)?;

        self.offset = next;
        Ok(next)
    }

    fn stat(&self) -> Result<Metadata> {
        Ok(Metadata {
            name: self.asset.name().to_string(),
            size: self.content.len(),
            mode: self.content.mode(),
            modified: self.content.modified(),
            is_dir: false,
        })
    }

    fn read_dir(&self) -> Result<Vec<Metadata>> {
        Err(Error::NotADirectory {
            path: self.asset.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::SearchPath;
    use std::time::Duration;
    use tempfile::TempDir;

    fn asset(name: &str, content: &str) -> Asset {
        Asset::new(
            name,
            format!("static/{name}"),
            content.as_bytes().to_vec(),
            0o644,
            SystemTime::UNIX_EPOCH + Duration::from_secs(100),
        )
    }

    fn tree() -> Directory {
        let nested = Directory::builder("nested", "static/dir/nested")
            .asset(asset("deep.txt", "deep"))
            .build()
            .unwrap();
        let dir = Directory::builder("dir", "static/dir")
            .asset(asset("file2.txt", "def"))
            .directory(nested)
            .build()
            .unwrap();
        Directory::builder("static", "static")
            .asset(asset("file.txt", "file"))
            .asset(asset("file2.txt", "file2"))
            .directory(dir)
            .build()
            .unwrap()
    }

    fn read_to_end(file: &mut dyn File, chunk: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; chunk];
        loop {
            match file.read(&mut buf) {
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) => {
                    assert!(e.is_invalid_state(), "unexpected error: {e}");
                    return out;
                }
            }
        }
    }

    #[test]
    fn test_asset_fs_paths() {
        let root = tree();
        let fs = AssetFs::new(&root, &Runtime::production());
        assert_eq!(
            fs.paths(),
            vec![
                "/dir/file2.txt",
                "/dir/nested/deep.txt",
                "/file.txt",
                "/file2.txt"
            ]
        );
        assert_eq!(fs.file_count(), root.asset_count());
    }

    #[test]
    fn test_asset_fs_maps_every_asset() {
        let root = tree();
        let fs = AssetFs::new(&root, &Runtime::production());
        assert_eq!(fs.file_count(), 4);
        for path in fs.paths() {
            let expected = fs.get(path).unwrap();
            assert_eq!(Some(expected.name()), path.rsplit('/').next());
        }
    }

    #[test]
    fn test_asset_fs_open_missing() {
        let root = tree();
        let fs = AssetFs::new(&root, &Runtime::production());
        assert!(fs.open("/nosuchfile.txt").unwrap_err().is_not_found());
        assert!(fs.open("/dir").unwrap_err().is_not_found());
        assert!(fs.open("file.txt").unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_until_exhausted_yields_content() {
        let root = tree();
        let fs = AssetFs::new(&root, &Runtime::production());
        for chunk in [1, 2, 3, 64] {
            let mut file = fs.open("/dir/nested/deep.txt").unwrap();
            assert_eq!(read_to_end(&mut *file, chunk), b"deep");
        }
    }

    #[test]
    fn test_read_empty_asset_is_invalid_state() {
        let root = Directory::builder("r", "r")
            .asset(asset("empty", ""))
            .build()
            .unwrap();
        let fs = AssetFs::new(&root, &Runtime::production());
        let mut file = fs.open("/empty").unwrap();
        let mut buf = [0u8; 4];
        assert!(file.read(&mut buf).unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_seek_whence() {
        let root = tree();
        let fs = AssetFs::new(&root, &Runtime::production());
        let mut file = fs.open("/file2.txt").unwrap();
        let mut buf = [0u8; 2];

        assert_eq!(file.seek(SeekFrom::Start(1)).unwrap(), 1);
        assert_eq!(file.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"il");

        assert_eq!(file.seek(SeekFrom::Current(-2)).unwrap(), 1);
        assert_eq!(file.seek(SeekFrom::End(-2)).unwrap(), 3);
        assert_eq!(file.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"e2");
    }

    #[test]
    fn test_seek_past_end_is_accepted_then_read_fails() {
        let root = tree();
        let fs = AssetFs::new(&root, &Runtime::production());
        let mut file = fs.open("/file.txt").unwrap();

        assert_eq!(file.seek(SeekFrom::End(10)).unwrap(), 14);
        let mut buf = [0u8; 4];
        assert!(file.read(&mut buf).unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_seek_before_start_is_accepted_then_read_fails() {
        let root = tree();
        let fs = AssetFs::new(&root, &Runtime::production());
        let mut file = fs.open("/file.txt").unwrap();

        assert_eq!(file.seek(SeekFrom::Current(-3)).unwrap(), -3);
        let mut buf = [0u8; 4];
        assert!(file.read(&mut buf).unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_seek_overflow_is_bad_offset() {
        let root = tree();
        let fs = AssetFs::new(&root, &Runtime::production());
        let mut file = fs.open("/file.txt").unwrap();

        file.seek(SeekFrom::Start(10)).unwrap();
        assert!(file.seek(SeekFrom::Current(i64::MAX)).unwrap_err().is_bad_offset());
        assert!(file.seek(SeekFrom::Start(u64::MAX)).unwrap_err().is_bad_offset());
    }

    #[test]
    fn test_stat_and_read_dir() {
        let root = tree();
        let fs = AssetFs::new(&root, &Runtime::production());
        let file = fs.open("/dir/file2.txt").unwrap();

        let meta = file.stat().unwrap();
        assert_eq!(meta.name, "file2.txt");
        assert_eq!(meta.size, 3);
        assert_eq!(meta.mode, 0o644);
        assert!(!meta.is_dir);

        assert!(matches!(file.read_dir(), Err(Error::NotADirectory { .. })));
    }

    #[test]
    fn test_metadata_of_asset() {
        let asset = asset("a.txt", "abc");
        let meta = Metadata::of(&asset);
        assert_eq!(meta.name(), "a.txt");
        assert_eq!(meta.size(), 3);
        assert!(!meta.is_dir());
    }

    #[test]
    fn test_mount_production_uses_assets() {
        let root = tree();
        let fs = mount(&root, &Runtime::production()).unwrap();
        let mut file = fs.open("/file.txt").unwrap();
        assert_eq!(read_to_end(&mut *file, 8), b"file");
    }

    #[test]
    fn test_mount_dev_mode_serves_disk() {
        let src = TempDir::new().unwrap();
        let live = src.path().join("static");
        std::fs::create_dir_all(live.join("dir")).unwrap();
        std::fs::write(live.join("file.txt"), "live file").unwrap();
        std::fs::write(live.join("extra.txt"), "not embedded").unwrap();

        let root = tree();
        let runtime = Runtime::development(SearchPath::from_roots([src.path()]));
        let fs = mount(&root, &runtime).unwrap();

        let mut file = fs.open("/file.txt").unwrap();
        assert_eq!(read_to_end(&mut *file, 4), b"live file");

        // siblings of embedded files are reachable in dev mode
        let mut extra = fs.open("/extra.txt").unwrap();
        assert_eq!(read_to_end(&mut *extra, 4), b"not embedded");
    }

    #[test]
    fn test_mount_dev_mode_missing_dir() {
        let src = TempDir::new().unwrap();
        let root = tree();
        let runtime = Runtime::development(SearchPath::from_roots([src.path()]));
        assert!(mount(&root, &runtime).unwrap_err().is_not_found());
    }
}
