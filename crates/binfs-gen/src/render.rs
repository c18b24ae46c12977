//! Rust source emission.
//!
//! Turns scanned trees into modules that build `binfs` values lazily on
//! first access. Content is written as hex byte literals, twelve per line.

use crate::scan::{DirNode, FileNode};

/// Header written at the top of every generated module.
pub const GENERATED_HEADER: &str = "// This file has been generated by binfs-gen, DO NOT EDIT!";

const BYTES_PER_LINE: usize = 12;
const INDENT: &str = "    ";

/// Renders a module exposing `pub static DIR: LazyLock<binfs::Directory>`.
#[must_use]
pub fn render_dir_module(root: &DirNode) -> String {
    let mut out = Emitter::default();
    out.preamble();
    out.line(0, &format!("/// Embedded contents of `{}`.", root.source_path));
    out.line(
        0,
        "pub static DIR: LazyLock<binfs::Directory> = LazyLock::new(|| {",
    );
    out.directory(1, root);
    out.line(0, "});");
    out.out
}

/// Renders a module exposing `pub static ASSET: LazyLock<binfs::Asset>`.
#[must_use]
pub fn render_file_module(file: &FileNode) -> String {
    let mut out = Emitter::default();
    out.preamble();
    out.line(0, &format!("/// Embedded contents of `{}`.", file.source_path));
    out.line(
        0,
        "pub static ASSET: LazyLock<binfs::Asset> = LazyLock::new(|| {",
    );
    out.asset_expr(1, file, "");
    out.line(0, "});");
    out.out
}

/// Formats bytes as comma-terminated hex literals, twelve per line.
///
/// ```
/// let lines = binfs_gen::render::hex_lines(b"file");
/// assert_eq!(lines, vec!["0x66, 0x69, 0x6c, 0x65,"]);
/// ```
#[must_use]
pub fn hex_lines(data: &[u8]) -> Vec<String> {
    data.chunks(BYTES_PER_LINE)
        .map(|chunk| {
            chunk
                .iter()
                .map(|byte| format!("0x{byte:02x},"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[derive(Debug, Default)]
struct Emitter {
    out: String,
}

impl Emitter {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn preamble(&mut self) {
        self.line(0, GENERATED_HEADER);
        self.line(0, "");
        self.line(0, "use std::sync::LazyLock;");
        self.line(0, "");
    }

    fn directory(&mut self, depth: usize, dir: &DirNode) {
        self.line(
            depth,
            &format!(
                "binfs::Directory::builder({:?}, {:?})",
                dir.name, dir.source_path
            ),
        );
        for file in &dir.files {
            self.line(depth + 1, ".asset(");
            self.asset_expr(depth + 2, file, ",");
            self.line(depth + 1, ")");
        }
        for child in &dir.dirs {
            self.line(depth + 1, ".directory(");
            self.directory(depth + 2, child);
            self.out.pop();
            self.out.push_str(",\n");
            self.line(depth + 1, ")");
        }
        let message = format!("invalid entry in {}", dir.source_path);
        self.line(depth + 1, ".build()");
        self.line(depth + 1, &format!(".expect({message:?})"));
    }

    fn asset_expr(&mut self, depth: usize, file: &FileNode, terminator: &str) {
        self.line(depth, "binfs::Asset::embedded(");
        self.line(depth + 1, &format!("{:?},", file.name));
        self.line(depth + 1, &format!("{:?},", file.source_path));
        if file.data.is_empty() {
            self.line(depth + 1, "&[],");
        } else {
            self.line(depth + 1, "&[");
            for hex in hex_lines(&file.data) {
                self.line(depth + 2, &hex);
            }
            self.line(depth + 1, "],");
        }
        self.line(depth + 1, &format!("0o{:o},", file.mode));
        self.line(depth + 1, &format!("{},", file.modified_secs));
        self.line(depth, &format!("){terminator}"));
    }
}
