//! binfs-gen: embed static file trees into Rust binaries.
//!
//! # Examples
//!
//! ```bash
//! # Write static/binfs_assets.rs
//! binfs-gen static
//!
//! # Embed a single file with an explicit source path
//! binfs-gen --prefix web/img logo.png
//! ```

use anyhow::{Result, bail};
use binfs_gen::{GenerateOptions, generate};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Generate Rust modules embedding static files as binfs assets.
#[derive(Parser, Debug)]
#[command(name = "binfs-gen")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directories or files to embed
    #[arg(required = true)]
    roots: Vec<PathBuf>,

    /// Output file (only valid with a single root)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source path of the root relative to the dev-mode search roots
    #[arg(short, long)]
    prefix: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.output.is_some() && cli.roots.len() > 1 {
        bail!("--output can only be used with a single root");
    }

    let options = GenerateOptions {
        output: cli.output,
        prefix: cli.prefix,
    };
    for root in &cli.roots {
        generate(root, &options)?;
    }
    Ok(())
}

/// Initializes logging to stderr.
///
/// `--verbose` forces debug level; otherwise `RUST_LOG` applies, defaulting
/// to info.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_roots_and_flags() {
        let cli = Cli::try_parse_from(["binfs-gen", "-v", "--prefix", "web", "static", "img"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.prefix.as_deref(), Some("web"));
        assert_eq!(cli.roots, vec![PathBuf::from("static"), PathBuf::from("img")]);
    }

    #[test]
    fn test_cli_requires_root() {
        assert!(Cli::try_parse_from(["binfs-gen"]).is_err());
    }

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
