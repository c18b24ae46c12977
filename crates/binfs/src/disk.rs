//! Live directories served straight from disk.
//!
//! Development mounts use [`DiskDir`] instead of the embedded tree. Every
//! file under the directory is reachable, not only the embedded ones.

use crate::error::{Error, Result};
use crate::fs::{File, FileSystem, Metadata};
use crate::path::VirtualPath;
use crate::refresh::{file_mode, modified_time};
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A [`FileSystem`] rooted at a real directory.
///
/// # Examples
///
/// ```
/// use binfs::{DiskDir, FileSystem};
///
/// let dir = DiskDir::new(std::env::temp_dir());
/// assert!(dir.open("/../etc/passwd").unwrap_err().is_not_found());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskDir {
    root: PathBuf,
}

impl DiskDir {
    /// Serves files below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory being served.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        // Escaping paths are reported as missing, never as a distinct error
        let virtual_path = VirtualPath::new(path).map_err(|_| Error::NotFound {
            path: path.to_string(),
        })?;
        Ok(self.root.join(virtual_path.to_relative()))
    }
}

impl FileSystem for DiskDir {
    fn open(&self, path: &str) -> Result<Box<dyn File + '_>> {
        let full = self.resolve(path)?;
        let metadata = fs::metadata(&full).map_err(|e| Error::from_io(path, e))?;
        let file = fs::File::open(&full).map_err(|e| Error::from_io(path, e))?;
        Ok(Box::new(DiskFile {
            file,
            path: full,
            metadata,
        }))
    }
}

/// An open file or directory on disk.
#[derive(Debug)]
pub struct DiskFile {
    file: fs::File,
    path: PathBuf,
    metadata: fs::Metadata,
}

impl DiskFile {
    /// Path of the open entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> Error {
        Error::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl File for DiskFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.file.read(buf).map_err(|e| self.io_error(e))?;
        if n == 0 && !buf.is_empty() {
            let offset = self.file.stream_position().map_err(|e| self.io_error(e))?;
            return Err(Error::InvalidState {
                path: self.path.display().to_string(),
                offset: i64::try_from(offset).unwrap_or(i64::MAX),
                size: self.metadata.len(),
            });
        }
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<i64> {
        let offset = self.file.seek(pos).map_err(|e| self.io_error(e))?;
        i64::try_from(offset).map_err(|_| Error::BadOffset {
            path: self.path.display().to_string(),
            offset,
            size: self.metadata.len(),
        })
    }

    fn stat(&self) -> Result<Metadata> {
        metadata_of(&self.path, &self.metadata)
    }

    fn read_dir(&self) -> Result<Vec<Metadata>> {
        if !self.metadata.is_dir() {
            return Err(Error::NotADirectory {
                path: self.path.display().to_string(),
            });
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(|e| self.io_error(e))? {
            let entry = entry.map_err(|e| self.io_error(e))?;
            let metadata = entry.metadata().map_err(|e| self.io_error(e))?;
            entries.push(metadata_of(&entry.path(), &metadata)?);
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

fn metadata_of(path: &Path, metadata: &fs::Metadata) -> Result<Metadata> {
    Ok(Metadata {
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size: metadata.len(),
        mode: file_mode(metadata),
        modified: modified_time(path, metadata)?,
        is_dir: metadata.is_dir(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("sub").join("b.txt"), "beta").unwrap();
        dir
    }

    #[test]
    fn test_disk_open_and_read() {
        let dir = fixture();
        let disk = DiskDir::new(dir.path());
        let mut file = disk.open("/sub/b.txt").unwrap();

        let mut buf = [0u8; 16];
        let n = file.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"beta");
        assert!(file.read(&mut buf).unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_disk_open_missing() {
        let dir = fixture();
        let disk = DiskDir::new(dir.path());
        assert!(disk.open("/nope.txt").unwrap_err().is_not_found());
    }

    #[test]
    fn test_disk_rejects_escape() {
        let dir = fixture();
        let disk = DiskDir::new(dir.path().join("sub"));
        assert!(disk.open("/../a.txt").unwrap_err().is_not_found());
        assert!(disk.open("a.txt").unwrap_err().is_not_found());
    }

    #[test]
    fn test_disk_seek_and_stat() {
        let dir = fixture();
        let disk = DiskDir::new(dir.path());
        let mut file = disk.open("/a.txt").unwrap();

        assert_eq!(file.seek(SeekFrom::End(-3)).unwrap(), 2);
        let mut buf = [0u8; 3];
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"pha");

        let meta = file.stat().unwrap();
        assert_eq!(meta.name, "a.txt");
        assert_eq!(meta.size, 5);
        assert!(!meta.is_dir);
    }

    #[test]
    fn test_disk_read_dir() {
        let dir = fixture();
        let disk = DiskDir::new(dir.path());

        let root = disk.open("/").unwrap();
        assert!(root.stat().unwrap().is_dir);
        let names: Vec<_> = root
            .read_dir()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["a.txt", "sub"]);

        let file = disk.open("/a.txt").unwrap();
        assert!(matches!(file.read_dir(), Err(Error::NotADirectory { .. })));
    }
}
