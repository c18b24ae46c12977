//! Generator for embedded `binfs` asset modules.
//!
//! Walks a source directory and writes a Rust module that compiles every file
//! into the binary as a `binfs::Asset`, grouped into a `binfs::Directory`
//! tree mirroring the source layout.
//!
//! # Examples
//!
//! ```no_run
//! use binfs_gen::{GenerateOptions, generate};
//! use std::path::Path;
//!
//! let written = generate(Path::new("static"), &GenerateOptions::default())?;
//! println!("wrote {}", written.display());
//! # Ok::<(), anyhow::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod render;
pub mod scan;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub use scan::{DirNode, FileNode};

/// Module written inside a directory root when no output path is given.
pub const DEFAULT_OUTPUT: &str = "binfs_assets.rs";

/// Options for one generator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Where to write the module.
    ///
    /// Default: `<root>/binfs_assets.rs` for directories, `<file>.rs` for a
    /// single file.
    pub output: Option<PathBuf>,

    /// Source path of the root relative to the dev-mode search roots.
    ///
    /// Default: the root's own name
    pub prefix: Option<String>,
}

/// Generates the module for `root` and returns the path written.
///
/// # Errors
///
/// Returns an error if `root` does not exist, cannot be scanned, or the
/// output cannot be written.
pub fn generate(root: &Path, options: &GenerateOptions) -> Result<PathBuf> {
    let root = fs::canonicalize(root)
        .with_context(|| format!("failed to resolve {}", root.display()))?;
    let name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", root.display()))?;

    let (module, default_output, files) = if root.is_dir() {
        let source_path = options.prefix.clone().unwrap_or(name);
        let tree = scan::scan_dir(&root, &source_path)?;
        (
            render::render_dir_module(&tree),
            root.join(DEFAULT_OUTPUT),
            tree.file_count(),
        )
    } else {
        let source_path = options
            .prefix
            .as_deref()
            .map_or_else(|| name.clone(), |prefix| scan::join_source(prefix, &name));
        let file = scan::scan_file(&root, &source_path)?;
        let mut output = root.clone().into_os_string();
        output.push(".rs");
        (render::render_file_module(&file), PathBuf::from(output), 1)
    };

    let output = options.output.clone().unwrap_or(default_output);
    fs::write(&output, module).with_context(|| format!("failed to write {}", output.display()))?;

    info!(
        root = %root.display(),
        output = %output.display(),
        files,
        "generated asset module"
    );
    Ok(output)
}
