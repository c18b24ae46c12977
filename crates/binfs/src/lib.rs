//! Embedded static assets exposed as a read-only filesystem.
//!
//! Files are compiled into the binary as [`Asset`]s grouped into a
//! [`Directory`] tree (usually emitted by `binfs-gen`). At runtime the tree is
//! mounted as a [`FileSystem`] and served over HTTP by [`StaticFiles`].
//!
//! # Development mode
//!
//! When the shared [`DevMode`] flag of a [`Runtime`] is on, every read first
//! reconciles the embedded bytes with the live file found on the
//! [`SearchPath`], so edits show up without recompiling. In production the
//! flag is off and no filesystem call is made after start-up.
//!
//! # Examples
//!
//! ```
//! use binfs::{Asset, Directory, FileSystem, Runtime, mount};
//! use std::time::SystemTime;
//!
//! let root = Directory::builder("static", "static")
//!     .asset(Asset::new("hello.txt", "static/hello.txt", b"hi".to_vec(), 0o644, SystemTime::UNIX_EPOCH))
//!     .build()?;
//!
//! let runtime = Runtime::production();
//! let fs = mount(&root, &runtime)?;
//! let mut file = fs.open("/hello.txt")?;
//!
//! let mut buf = [0u8; 8];
//! let n = file.read(&mut buf)?;
//! assert_eq!(&buf[..n], b"hi");
//! # Ok::<(), binfs::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod asset;
mod builder;
mod config;
mod directory;
mod disk;
mod error;
mod fs;
mod path;
mod refresh;

pub mod serve;

pub use asset::{Asset, Content, Snapshot};
pub use builder::DirectoryBuilder;
pub use config::{BinfsConfig, Runtime};
pub use directory::Directory;
pub use disk::{DiskDir, DiskFile};
pub use error::{Error, Result};
pub use fs::{AssetFile, AssetFs, File, FileInfo, FileSystem, Metadata, mount};
pub use path::VirtualPath;
pub use refresh::{DevMode, Located, RootDir, SearchPath, SourceResolver};
pub use serve::StaticFiles;
