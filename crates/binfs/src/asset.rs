//! Embedded assets.
//!
//! An [`Asset`] is a named blob of bytes with file metadata. Its content and
//! metadata live together in one immutable [`Snapshot`]; a dev-mode refresh
//! builds a new snapshot and swaps it in, so readers never see a buffer that
//! disagrees with its timestamp.
//!
//! # Examples
//!
//! ```
//! use binfs::{Asset, FileInfo, Runtime};
//! use std::time::SystemTime;
//!
//! let asset = Asset::new("file.txt", "static/file.txt", b"file".to_vec(), 0o644, SystemTime::UNIX_EPOCH);
//! let runtime = Runtime::production();
//!
//! assert_eq!(asset.name(), "file.txt");
//! assert_eq!(asset.content(&runtime)?.bytes(), b"file");
//! # Ok::<(), binfs::Error>(())
//! ```

use crate::config::Runtime;
use crate::error::{Error, Result};
use crate::fs::FileInfo;
use crate::refresh;
use handlebars::Template;
use parking_lot::{Mutex, RwLock};
use std::borrow::Cow;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, error};

/// Content and metadata of an asset at one point in time.
#[derive(Debug)]
pub struct Snapshot {
    data: Cow<'static, [u8]>,
    mode: u32,
    modified: SystemTime,
    generation: u64,
}

impl Snapshot {
    /// The content bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Content length in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns `true` if the content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Permission bits.
    #[must_use]
    pub const fn mode(&self) -> u32 {
        self.mode
    }

    /// Modification time of this content.
    #[must_use]
    pub const fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Number of refreshes that replaced the content before this snapshot.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl Deref for Snapshot {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for Snapshot {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Shared handle to a content snapshot.
pub type Content = Arc<Snapshot>;

#[derive(Debug)]
struct CachedTemplate {
    generation: u64,
    template: Arc<Template>,
}

/// A named, embedded file.
///
/// In production an asset is immutable. In development mode
/// [`refresh`](Self::refresh) may replace its snapshot with the live file.
#[derive(Debug)]
pub struct Asset {
    name: String,
    source_path: PathBuf,
    snapshot: RwLock<Content>,
    refresh_lock: Mutex<()>,
    template: Mutex<Option<CachedTemplate>>,
}

impl Asset {
    /// Creates an asset.
    ///
    /// `source_path` is relative to the dev-mode search roots and is only
    /// consulted in development mode.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<PathBuf>,
        data: impl Into<Cow<'static, [u8]>>,
        mode: u32,
        modified: SystemTime,
    ) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
            snapshot: RwLock::new(Arc::new(Snapshot {
                data: data.into(),
                mode,
                modified,
                generation: 0,
            })),
            refresh_lock: Mutex::new(()),
            template: Mutex::new(None),
        }
    }

    /// Creates an asset from bytes compiled into the binary.
    ///
    /// This is the constructor emitted by `binfs-gen`; `modified_secs` is the
    /// source file's modification time in seconds since the Unix epoch.
    #[must_use]
    pub fn embedded(
        name: &'static str,
        source_path: &'static str,
        data: &'static [u8],
        mode: u32,
        modified_secs: u64,
    ) -> Self {
        Self::new(
            name,
            source_path,
            data,
            mode,
            SystemTime::UNIX_EPOCH + Duration::from_secs(modified_secs),
        )
    }

    /// Path of the live file relative to the search roots.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Current snapshot, without refreshing.
    #[must_use]
    pub fn snapshot(&self) -> Content {
        Arc::clone(&self.snapshot.read())
    }

    /// Reconciles the content with the live file.
    ///
    /// Returns `Ok(true)` if the content was replaced. Outside development
    /// mode this is a no-op returning `Ok(false)`.
    ///
    /// Concurrent refreshes of one asset are serialized: the first reads the
    /// disk file, the others then observe the advanced timestamp and report
    /// no change.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no search root has the file, and
    /// `Error::Io` if it exists but cannot be read.
    pub fn refresh(&self, runtime: &Runtime) -> Result<bool> {
        if !runtime.is_dev_mode() {
            return Ok(false);
        }

        let _guard = self.refresh_lock.lock();
        let current = self.snapshot();

        let Some(fresh) =
            refresh::probe(runtime.search_path(), &self.source_path, current.modified)?
        else {
            return Ok(false);
        };

        let next = Arc::new(Snapshot {
            data: Cow::Owned(fresh.data),
            mode: fresh.mode,
            modified: fresh.modified,
            generation: current.generation + 1,
        });
        *self.snapshot.write() = next;

        debug!(asset = %self.name, "asset content replaced from disk");
        Ok(true)
    }

    /// Returns the current content, refreshing first.
    ///
    /// When the live file is missing in development mode the embedded
    /// content is served.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the live file exists but cannot be read.
    pub fn content(&self, runtime: &Runtime) -> Result<Content> {
        match self.refresh(runtime) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                debug!(asset = %self.name, "no live file, serving embedded content");
            }
            Err(e) => return Err(e),
        }
        Ok(self.snapshot())
    }

    /// Copies content starting at `offset` into `buf`.
    ///
    /// Returns the number of bytes copied, which is zero when `offset` equals
    /// the content length.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadOffset` if `offset` is past the end of the content.
    pub fn read_at(&self, buf: &mut [u8], offset: u64, runtime: &Runtime) -> Result<usize> {
        let content = self.content(runtime)?;
        let start = usize::try_from(offset)
            .ok()
            .filter(|start| *start <= content.data.len())
            .ok_or_else(|| Error::BadOffset {
                path: self.name.clone(),
                offset,
                size: content.len(),
            })?;

        let available = &content.data[start..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }

    /// Returns the content parsed as a Handlebars template.
    ///
    /// The parse is cached and redone only after the content changes. If the
    /// new content fails to parse the error is logged and the previous
    /// template is returned, so `Ok(None)` means no version has ever parsed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if refreshing from disk fails.
    pub fn template(&self, runtime: &Runtime) -> Result<Option<Arc<Template>>> {
        let content = self.content(runtime)?;
        let mut cache = self.template.lock();

        if let Some(cached) = cache.as_ref() {
            if cached.generation == content.generation {
                return Ok(Some(Arc::clone(&cached.template)));
            }
        }

        match self.parse_template(&content) {
            Ok(template) => {
                let template = Arc::new(template);
                *cache = Some(CachedTemplate {
                    generation: content.generation,
                    template: Arc::clone(&template),
                });
                Ok(Some(template))
            }
            Err(e) => {
                error!(asset = %self.name, error = %e, "error parsing template");
                Ok(cache.as_ref().map(|cached| Arc::clone(&cached.template)))
            }
        }
    }

    fn parse_template(&self, content: &Snapshot) -> Result<Template> {
        let source = std::str::from_utf8(content.bytes()).map_err(|e| Error::TemplateParse {
            name: self.name.clone(),
            message: e.to_string(),
        })?;

        Template::compile(source).map_err(|e| Error::TemplateParse {
            name: self.name.clone(),
            message: e.to_string(),
        })
    }
}

impl FileInfo for Asset {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.snapshot.read().len()
    }

    fn mode(&self) -> u32 {
        self.snapshot.read().mode
    }

    fn modified(&self) -> SystemTime {
        self.snapshot.read().modified
    }

    fn is_dir(&self) -> bool {
        false
    }
}
