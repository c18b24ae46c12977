//! Directory trees of assets.

use crate::asset::Asset;
use crate::builder::DirectoryBuilder;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// A named node owning assets and child directories.
///
/// Entry names are unique within a directory; construction fails otherwise.
/// Trees are built once and never change.
///
/// # Examples
///
/// ```
/// use binfs::{Asset, Directory};
/// use std::time::SystemTime;
///
/// let dir = Directory::builder("dir", "static/dir")
///     .asset(Asset::new("file2.txt", "static/dir/file2.txt", b"def".to_vec(), 0o644, SystemTime::UNIX_EPOCH))
///     .build()?;
///
/// let root = Directory::new("static", "static", Vec::new(), vec![dir])?;
/// assert_eq!(root.directories()[0].name(), "dir");
/// # Ok::<(), binfs::Error>(())
/// ```
#[derive(Debug)]
pub struct Directory {
    name: String,
    source_path: PathBuf,
    assets: Vec<Asset>,
    directories: Vec<Self>,
}

impl Directory {
    /// Creates a directory from its entries.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateName` if two entries share a name.
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<PathBuf>,
        assets: Vec<Asset>,
        directories: Vec<Self>,
    ) -> Result<Self> {
        Self::builder(name, source_path)
            .assets(assets)
            .directories(directories)
            .build()
    }

    /// Starts building a directory.
    #[must_use]
    pub fn builder(name: impl Into<String>, source_path: impl Into<PathBuf>) -> DirectoryBuilder {
        DirectoryBuilder::new(name, source_path)
    }

    pub(crate) const fn from_parts(
        name: String,
        source_path: PathBuf,
        assets: Vec<Asset>,
        directories: Vec<Self>,
    ) -> Self {
        Self {
            name,
            source_path,
            assets,
            directories,
        }
    }

    /// Directory name segment.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the live directory relative to the search roots.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Assets in insertion order.
    #[must_use]
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Child directories in insertion order.
    #[must_use]
    pub fn directories(&self) -> &[Self] {
        &self.directories
    }

    /// Total number of assets in this subtree.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
            + self
                .directories
                .iter()
                .map(Self::asset_count)
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileInfo;
    use std::time::SystemTime;

    fn asset(name: &str) -> Asset {
        Asset::new(name, name, Vec::new(), 0o644, SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn test_directory_new_keeps_order() {
        let dir = Directory::new("root", "root", vec![asset("b"), asset("a")], Vec::new()).unwrap();
        let names: Vec<_> = dir.assets().iter().map(FileInfo::name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_directory_duplicate_asset_fails() {
        let err = Directory::new("root", "root", vec![asset("a"), asset("a")], Vec::new())
            .unwrap_err();
        assert!(err.is_duplicate_name());
    }

    #[test]
    fn test_directory_asset_and_dir_name_clash_fails() {
        let child = Directory::new("x", "root/x", Vec::new(), Vec::new()).unwrap();
        let err = Directory::new("root", "root", vec![asset("x")], vec![child]).unwrap_err();
        assert!(err.is_duplicate_name());
    }

    #[test]
    fn test_directory_asset_count() {
        let child = Directory::new("d", "root/d", vec![asset("1"), asset("2")], Vec::new()).unwrap();
        let root = Directory::new("root", "root", vec![asset("3")], vec![child]).unwrap();
        assert_eq!(root.asset_count(), 3);
        assert_eq!(root.source_path(), Path::new("root"));
    }
}
