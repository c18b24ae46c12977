//! Error types for the asset filesystem.
//!
//! Every failure carries the path or asset it concerns. Callers classify
//! errors with the `is_xxx()` helpers; the HTTP layer maps
//! [`Error::is_not_found`] to `404 Not Found`.
//!
//! # Examples
//!
//! ```
//! use binfs::Error;
//!
//! let error = Error::NotFound {
//!     path: "/missing.txt".to_string(),
//! };
//!
//! assert!(error.is_not_found());
//! ```

use thiserror::Error;

/// Errors that can occur while reading, refreshing or serving assets.
#[derive(Error, Debug)]
pub enum Error {
    /// Path is absent from the asset tree, or from every dev-mode search root.
    #[error("File not found: {path}")]
    NotFound {
        /// The path that was not found
        path: String,
    },

    /// Random-access read requested past the end of the content.
    #[error("Bad offset {offset} for {path} ({size} bytes)")]
    BadOffset {
        /// Asset or file being read
        path: String,
        /// Requested offset
        offset: u64,
        /// Content length at the time of the read
        size: u64,
    },

    /// Sequential read attempted at or past the end of the content.
    ///
    /// This is how an open asset file reports exhaustion.
    #[error("Invalid state: read at offset {offset} of {path} ({size} bytes)")]
    InvalidState {
        /// Asset or file being read
        path: String,
        /// Cursor position when the read was attempted
        offset: i64,
        /// Content length at the time of the read
        size: u64,
    },

    /// Underlying disk access failed for a reason other than absence.
    #[error("I/O failure on {path}")]
    Io {
        /// File or directory being accessed
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Asset content could not be parsed as a template.
    ///
    /// Never returned by [`Asset::template`](crate::Asset::template), which
    /// logs it and keeps serving the last good template.
    #[error("Template parse failure in {name}: {message}")]
    TemplateParse {
        /// Asset name
        name: String,
        /// Parser message
        message: String,
    },

    /// Two entries of one directory share a name.
    #[error("Duplicate entry '{name}' in directory {directory}")]
    DuplicateName {
        /// Directory being built
        directory: String,
        /// The clashing entry name
        name: String,
    },

    /// Directory listing requested on something that cannot be listed.
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// The path that is not a listable directory
        path: String,
    },

    /// Path is malformed (relative, empty, or escaping with `..`).
    #[error("Invalid path: {path}")]
    InvalidPath {
        /// The invalid path
        path: String,
    },

    /// Configuration is missing, unreadable or contradictory.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },
}

impl Error {
    /// Returns `true` if this is a not found error.
    ///
    /// # Examples
    ///
    /// ```
    /// use binfs::Error;
    ///
    /// let error = Error::NotFound {
    ///     path: "/test.txt".to_string(),
    /// };
    ///
    /// assert!(error.is_not_found());
    /// ```
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a bad offset error.
    #[must_use]
    pub const fn is_bad_offset(&self) -> bool {
        matches!(self, Self::BadOffset { .. })
    }

    /// Returns `true` if a sequential read ran past the end of the content.
    #[must_use]
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// Returns `true` if this is a disk I/O failure.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns `true` if this is an invalid path error.
    #[must_use]
    pub const fn is_invalid_path(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }

    /// Returns `true` if this is a duplicate entry error.
    #[must_use]
    pub const fn is_duplicate_name(&self) -> bool {
        matches!(self, Self::DuplicateName { .. })
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Wraps an I/O error, turning `ErrorKind::NotFound` into [`Error::NotFound`].
    pub(crate) fn from_io(path: impl Into<String>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path: path.into() }
        } else {
            Self::Io {
                path: path.into(),
                source,
            }
        }
    }
}

/// Type alias for asset filesystem results.
///
/// # Examples
///
/// ```
/// use binfs::{Result, VirtualPath};
///
/// fn validate(path: &str) -> Result<VirtualPath> {
///     VirtualPath::new(path)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;
