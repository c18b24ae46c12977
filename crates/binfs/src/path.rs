//! Validated virtual paths.
//!
//! Virtual paths use Unix conventions on every platform: rooted at `/`,
//! separated by `/`, and never containing `..` segments.
//!
//! # Examples
//!
//! ```
//! use binfs::VirtualPath;
//!
//! let path = VirtualPath::new("/css/site.css").unwrap();
//! assert_eq!(path.as_str(), "/css/site.css");
//! assert_eq!(path.file_name(), Some("site.css"));
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;

/// A validated, root-relative virtual path.
///
/// ```
/// use binfs::VirtualPath;
///
/// // Invalid paths are rejected
/// assert!(VirtualPath::new("relative/path").is_err());
/// assert!(VirtualPath::new("/parent/../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPath(String);

impl VirtualPath {
    /// The root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Creates a new `VirtualPath`.
    ///
    /// Backslashes are treated as separators so that Windows-style request
    /// paths cannot smuggle `..` past validation.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if the path is empty, does not start with
    /// `/`, or contains a `..` segment.
    pub fn new(path: impl AsRef<str>) -> Result<Self> {
        let path = path.as_ref();
        let normalized = path.replace('\\', "/");

        if !normalized.starts_with('/') {
            return Err(Error::InvalidPath {
                path: path.to_string(),
            });
        }

        if normalized.split('/').any(|segment| segment == "..") {
            return Err(Error::InvalidPath {
                path: path.to_string(),
            });
        }

        Ok(Self(normalized))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the non-empty segments, skipping `.`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
    }

    /// Returns the last segment, or `None` for the root.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Returns `true` if the path names a directory (ends with `/`).
    #[must_use]
    pub fn is_dir_path(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Appends a segment.
    ///
    /// ```
    /// use binfs::VirtualPath;
    ///
    /// let dir = VirtualPath::new("/docs/").unwrap();
    /// assert_eq!(dir.join("index.html").as_str(), "/docs/index.html");
    /// ```
    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        let mut joined = self.0.clone();
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(segment.trim_start_matches('/'));
        Self(joined)
    }

    /// Converts to a relative native path, suitable for joining onto a root.
    #[must_use]
    pub fn to_relative(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VirtualPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_virtual_path_new_valid() {
        let path = VirtualPath::new("/dir/file2.txt").unwrap();
        assert_eq!(path.as_str(), "/dir/file2.txt");
    }

    #[test]
    fn test_virtual_path_relative_fails() {
        let result = VirtualPath::new("relative/path");
        assert!(result.unwrap_err().is_invalid_path());
    }

    #[test]
    fn test_virtual_path_empty_fails() {
        assert!(VirtualPath::new("").is_err());
    }

    #[test]
    fn test_virtual_path_parent_segment_fails() {
        assert!(VirtualPath::new("/a/../b").is_err());
        assert!(VirtualPath::new("/..").is_err());
        assert!(VirtualPath::new("/a\\..\\b").is_err());
    }

    #[test]
    fn test_virtual_path_dots_in_names_allowed() {
        let path = VirtualPath::new("/archive..tar").unwrap();
        assert_eq!(path.file_name(), Some("archive..tar"));
    }

    #[test]
    fn test_virtual_path_segments_skip_empty() {
        let path = VirtualPath::new("//a/./b/").unwrap();
        let segments: Vec<_> = path.segments().collect();
        assert_eq!(segments, vec!["a", "b"]);
    }

    #[test]
    fn test_virtual_path_root() {
        let root = VirtualPath::root();
        assert!(root.is_dir_path());
        assert_eq!(root.file_name(), None);
        assert_eq!(root.join("file.txt").as_str(), "/file.txt");
    }

    #[test]
    fn test_virtual_path_to_relative() {
        let path = VirtualPath::new("/dir/file2.txt").unwrap();
        assert_eq!(path.to_relative(), Path::new("dir").join("file2.txt"));
    }

    #[test]
    fn test_virtual_path_display() {
        let path = VirtualPath::new("/file.txt").unwrap();
        assert_eq!(format!("{path}"), "/file.txt");
    }
}
