//! Configuration and the runtime handle.
//!
//! [`BinfsConfig`] is the plain, serializable description (from a TOML file or
//! environment variables). [`Runtime`] is what assets and mounts consume: a
//! shared [`DevMode`] flag, the dev-mode [`SearchPath`], and the process start
//! stamp used for production `Last-Modified` headers.
//!
//! # Examples
//!
//! ```
//! use binfs::{BinfsConfig, Runtime};
//!
//! let config: BinfsConfig = toml::from_str(r#"
//!     dev_mode = true
//!     search_roots = ["./web", "./shared"]
//! "#).unwrap();
//!
//! let runtime = Runtime::from_config(&config).unwrap();
//! assert!(runtime.is_dev_mode());
//! assert_eq!(runtime.search_path().len(), 2);
//! ```

use crate::error::{Error, Result};
use crate::refresh::{DevMode, SearchPath};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Environment variable enabling development mode.
pub const DEV_MODE_ENV: &str = "BINFS_DEV_MODE";

/// Environment variable holding the dev-mode search roots, in the platform's
/// path-list syntax (`:`-separated on Unix).
pub const SEARCH_PATH_ENV: &str = "BINFS_SEARCH_PATH";

/// Serializable runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BinfsConfig {
    /// Serve live files from disk instead of embedded bytes.
    ///
    /// Default: false
    pub dev_mode: bool,

    /// Source roots searched, in order, for live files in development mode.
    ///
    /// Default: empty
    pub search_roots: Vec<PathBuf>,
}

impl BinfsConfig {
    /// Reads configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `BINFS_DEV_MODE` is not a recognizable boolean.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an environment lookup function.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the dev-mode value is not a recognizable boolean.
    ///
    /// # Examples
    ///
    /// ```
    /// use binfs::BinfsConfig;
    ///
    /// let config = BinfsConfig::from_vars(|key| match key {
    ///     "BINFS_DEV_MODE" => Some("yes".to_string()),
    ///     _ => None,
    /// }).unwrap();
    ///
    /// assert!(config.dev_mode);
    /// ```
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(DEV_MODE_ENV) {
            config.dev_mode = parse_bool(&value).ok_or_else(|| Error::Config {
                message: format!("{DEV_MODE_ENV} must be a boolean, got '{value}'"),
            })?;
        }

        if let Some(value) = lookup(SEARCH_PATH_ENV) {
            config.search_roots = std::env::split_paths(&value)
                .filter(|root| !root.as_os_str().is_empty())
                .collect();
        }

        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// Relative search roots are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if it
    /// is not valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {e}", path.display()),
        })?;

        if let Some(base) = path.parent() {
            for root in &mut config.search_roots {
                if root.is_relative() {
                    *root = base.join(&*root);
                }
            }
        }

        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if development mode is on without any search root.
    pub fn validate(&self) -> Result<()> {
        if self.dev_mode && self.search_roots.is_empty() {
            return Err(Error::Config {
                message: "dev_mode requires at least one search root".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Live handle threaded through asset accessors and mounts.
///
/// Cloning is cheap; clones share the dev-mode flag and search path.
#[derive(Debug, Clone)]
pub struct Runtime {
    dev_mode: DevMode,
    search_path: Arc<SearchPath>,
    started: SystemTime,
}

impl Runtime {
    /// Creates a runtime from its parts.
    #[must_use]
    pub fn new(dev_mode: DevMode, search_path: SearchPath) -> Self {
        Self {
            dev_mode,
            search_path: Arc::new(search_path),
            started: SystemTime::now(),
        }
    }

    /// Production runtime: dev mode off, empty search path.
    #[must_use]
    pub fn production() -> Self {
        Self::new(DevMode::new(false), SearchPath::new())
    }

    /// Development runtime over the given search path.
    #[must_use]
    pub fn development(search_path: SearchPath) -> Self {
        Self::new(DevMode::new(true), search_path)
    }

    /// Builds a runtime from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn from_config(config: &BinfsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            DevMode::new(config.dev_mode),
            SearchPath::from_roots(config.search_roots.iter().cloned()),
        ))
    }

    /// Returns `true` if development mode is currently on.
    #[must_use]
    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode.is_enabled()
    }

    /// The shared dev-mode flag.
    #[must_use]
    pub const fn dev_mode(&self) -> &DevMode {
        &self.dev_mode
    }

    /// The dev-mode search path.
    #[must_use]
    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Time this runtime was created; stands in for every asset's
    /// modification time when serving in production.
    #[must_use]
    pub const fn started(&self) -> SystemTime {
        self.started
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::production()
    }
}
