//! Builder pattern for constructing directory trees.
//!
//! Provides a fluent API used both by hand-written trees and by the code
//! `binfs-gen` emits. Errors are collected while adding entries and the first
//! one is returned from [`DirectoryBuilder::build`].
//!
//! # Examples
//!
//! ```
//! use binfs::{Asset, Directory};
//! use std::time::SystemTime;
//!
//! let root = Directory::builder("static", "static")
//!     .asset(Asset::new("file.txt", "static/file.txt", b"file".to_vec(), 0o644, SystemTime::UNIX_EPOCH))
//!     .directory(Directory::builder("dir", "static/dir").build()?)
//!     .build()?;
//!
//! assert_eq!(root.assets().len(), 1);
//! assert_eq!(root.directories().len(), 1);
//! # Ok::<(), binfs::Error>(())
//! ```

use crate::asset::Asset;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::fs::FileInfo;
use std::collections::HashSet;
use std::path::PathBuf;

/// Builder for a [`Directory`].
#[derive(Debug)]
pub struct DirectoryBuilder {
    name: String,
    source_path: PathBuf,
    assets: Vec<Asset>,
    directories: Vec<Directory>,
    names: HashSet<String>,
    errors: Vec<Error>,
}

impl DirectoryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
            assets: Vec::new(),
            directories: Vec::new(),
            names: HashSet::new(),
            errors: Vec::new(),
        }
    }

    /// Adds an asset.
    ///
    /// A name already used by another entry, or one that is not a single
    /// path segment, is recorded as an error and reported by
    /// [`build`](Self::build).
    #[must_use]
    pub fn asset(mut self, asset: Asset) -> Self {
        if self.claim(asset.name()) {
            self.assets.push(asset);
        }
        self
    }

    /// Adds several assets in order.
    #[must_use]
    pub fn assets(self, assets: impl IntoIterator<Item = Asset>) -> Self {
        assets.into_iter().fold(self, Self::asset)
    }

    /// Adds a child directory.
    #[must_use]
    pub fn directory(mut self, directory: Directory) -> Self {
        if self.claim(directory.name()) {
            self.directories.push(directory);
        }
        self
    }

    /// Adds several child directories in order.
    #[must_use]
    pub fn directories(self, directories: impl IntoIterator<Item = Directory>) -> Self {
        directories.into_iter().fold(self, Self::directory)
    }

    /// Number of entries accepted so far.
    #[must_use]
    pub const fn entry_count(&self) -> usize {
        self.assets.len() + self.directories.len()
    }

    /// Consumes the builder and returns the directory.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered while adding entries, if any.
    pub fn build(self) -> Result<Directory> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        Ok(Directory::from_parts(
            self.name,
            self.source_path,
            self.assets,
            self.directories,
        ))
    }

    fn claim(&mut self, name: &str) -> bool {
        if !is_segment(name) {
            self.errors.push(Error::InvalidPath {
                path: format!("{}/{name}", self.name),
            });
            return false;
        }
        if self.names.insert(name.to_string()) {
            return true;
        }
        self.errors.push(Error::DuplicateName {
            directory: self.name.clone(),
            name: name.to_string(),
        });
        false
    }
}

// Entry names become single segments of virtual paths
fn is_segment(name: &str) -> bool {
    !matches!(name, "" | "." | "..") && !name.contains(['/', '\\'])
}
