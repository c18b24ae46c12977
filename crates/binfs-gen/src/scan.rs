//! Source tree scanning.
//!
//! Reads a directory (or a single file) into an in-memory tree of
//! [`DirNode`]s and [`FileNode`]s, ready for rendering.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

/// A file to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Base name
    pub name: String,
    /// Path relative to the dev-mode search roots
    pub source_path: String,
    /// File content
    pub data: Vec<u8>,
    /// Permission bits
    pub mode: u32,
    /// Modification time in seconds since the Unix epoch
    pub modified_secs: u64,
}

/// A directory to embed, with entries sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirNode {
    /// Base name
    pub name: String,
    /// Path relative to the dev-mode search roots
    pub source_path: String,
    /// Files directly inside this directory
    pub files: Vec<FileNode>,
    /// Subdirectories
    pub dirs: Vec<Self>,
}

impl DirNode {
    /// Total number of files in this subtree.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len() + self.dirs.iter().map(Self::file_count).sum::<usize>()
    }
}

/// Returns `true` for entries that are never embedded: hidden files, Rust
/// sources (including generated modules) and editor backups.
#[must_use]
pub fn is_skipped(name: &str) -> bool {
    name.starts_with('.') || name.ends_with(".rs") || name.ends_with('~')
}

/// Scans the directory at `path`, recording `source_path` as its location
/// relative to the search roots.
///
/// # Errors
///
/// Returns an error if the directory or any embedded file cannot be read.
pub fn scan_dir(path: &Path, source_path: &str) -> Result<DirNode> {
    anyhow::ensure!(path.is_dir(), "{} is not a directory", path.display());

    let mut node = DirNode {
        name: base_name(path)?,
        source_path: source_path.to_string(),
        files: Vec::new(),
        dirs: Vec::new(),
    };
    debug!(path = %path.display(), source_path, "scanning directory");

    let entries = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped(&entry.file_name().to_string_lossy()));

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", path.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let child_source = join_source(source_path, &name);

        if entry.file_type().is_dir() {
            node.dirs.push(scan_dir(entry.path(), &child_source)?);
        } else {
            node.files.push(scan_file(entry.path(), &child_source)?);
        }
    }

    Ok(node)
}

/// Reads one file to embed.
///
/// # Errors
///
/// Returns an error if the file or its metadata cannot be read.
pub fn scan_file(path: &Path, source_path: &str) -> Result<FileNode> {
    let metadata =
        fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    debug!(path = %path.display(), bytes = data.len(), "embedding file");

    let modified_secs = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map_or(0, |since| since.as_secs());

    Ok(FileNode {
        name: base_name(path)?,
        source_path: source_path.to_string(),
        data,
        mode: file_mode(&metadata),
        modified_secs,
    })
}

/// Joins a child name onto a source path.
#[must_use]
pub fn join_source(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{name}", parent.trim_end_matches('/'))
    }
}

fn base_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
