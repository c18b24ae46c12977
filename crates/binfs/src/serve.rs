//! Static file serving over `http` types.
//!
//! [`StaticFiles`] answers `GET` and `HEAD` requests from any [`FileSystem`],
//! with conditional requests and single byte ranges. It is independent of a
//! particular server: feed it an `http::Request` and send back the response.
//!
//! # Examples
//!
//! ```
//! use binfs::{Asset, AssetFs, Directory, Runtime, StaticFiles};
//! use http::{Request, StatusCode};
//! use std::time::SystemTime;
//!
//! let root = Directory::builder("static", "static")
//!     .asset(Asset::new("file.txt", "static/file.txt", b"file".to_vec(), 0o644, SystemTime::UNIX_EPOCH))
//!     .build()?;
//! let runtime = Runtime::production();
//! let files = StaticFiles::new(AssetFs::new(&root, &runtime), &runtime).with_prefix("/stat");
//!
//! let request = Request::get("/stat/file.txt").body(()).unwrap();
//! let response = files.handle(&request);
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body(), b"file");
//! # Ok::<(), binfs::Error>(())
//! ```

use crate::asset::Asset;
use crate::config::Runtime;
use crate::error::{Error, Result};
use crate::fs::{File, FileInfo, FileSystem};
use crate::path::VirtualPath;
use crate::refresh::modified_time;
use chrono::{DateTime, NaiveDateTime, Utc};
use http::header::{
    ACCEPT_RANGES, ALLOW, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG, HeaderMap,
    IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, RANGE,
};
use http::{Method, Request, Response, StatusCode, response};
use std::time::SystemTime;
use tracing::{debug, error};

/// File served for requests naming a directory.
pub const INDEX_FILE: &str = "index.html";

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const READ_CHUNK: usize = 8 * 1024;

/// HTTP handler serving files from a [`FileSystem`].
#[derive(Debug)]
pub struct StaticFiles<F> {
    fs: F,
    prefix: String,
    runtime: Runtime,
}

impl<F: FileSystem> StaticFiles<F> {
    /// Serves `fs` at the root of the URL space.
    #[must_use]
    pub fn new(fs: F, runtime: &Runtime) -> Self {
        Self {
            fs,
            prefix: String::new(),
            runtime: runtime.clone(),
        }
    }

    /// Serves under `prefix` instead; requests outside it are 404.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// The mount prefix, empty when serving at the root.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The wrapped filesystem.
    #[must_use]
    pub const fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Answers one request.
    #[must_use]
    pub fn handle(&self, request: &Request<()>) -> Response<Vec<u8>> {
        if let Some(response) = reject_method(request) {
            return response;
        }

        let Some(path) = self.strip_prefix(request.uri().path()) else {
            return status_only(StatusCode::NOT_FOUND);
        };

        match self.load(path) {
            Ok(file) => {
                let last_modified = if self.runtime.is_dev_mode() {
                    file.modified
                } else {
                    self.runtime.started()
                };
                respond(request, &file, last_modified)
            }
            Err(e) => error_response(request.uri().path(), &e),
        }
    }

    fn strip_prefix<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.prefix.is_empty() {
            return Some(path);
        }
        match path.strip_prefix(self.prefix.as_str())? {
            "" => Some("/"),
            rest if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }

    fn load(&self, raw: &str) -> Result<LoadedFile> {
        let decoded = urlencoding::decode(raw).map_err(|_| Error::InvalidPath {
            path: raw.to_string(),
        })?;
        let requested = VirtualPath::new(decoded.as_ref())?;

        let mut target = requested
            .segments()
            .fold(VirtualPath::root(), |path, segment| path.join(segment));
        if requested.is_dir_path() {
            target = target.join(INDEX_FILE);
        }

        // Asset trees have no directory entries; a miss may still name one
        let mut file = match self.fs.open(target.as_str()) {
            Err(e) if e.is_not_found() && !requested.is_dir_path() => {
                target = target.join(INDEX_FILE);
                self.fs.open(target.as_str()).map_err(|_| e)?
            }
            opened => opened?,
        };
        let mut metadata = file.stat()?;
        if metadata.is_dir {
            target = target.join(INDEX_FILE);
            file = self.fs.open(target.as_str())?;
            metadata = file.stat()?;
            if metadata.is_dir {
                return Err(Error::NotFound {
                    path: target.to_string(),
                });
            }
        }

        Ok(LoadedFile {
            body: read_all(&mut *file, metadata.size)?,
            name: metadata.name,
            modified: metadata.modified,
        })
    }
}

/// Serves a single asset, independent of any directory tree.
///
/// In production the embedded snapshot is served with the runtime's start
/// stamp as `Last-Modified`. In development mode the live file is served
/// with its own modification time, or 404 when no search root has it.
#[must_use]
pub fn serve_asset(asset: &Asset, runtime: &Runtime, request: &Request<()>) -> Response<Vec<u8>> {
    if let Some(response) = reject_method(request) {
        return response;
    }

    let loaded = if runtime.is_dev_mode() {
        load_live(asset, runtime)
    } else {
        let snapshot = asset.snapshot();
        Ok(LoadedFile {
            name: asset.name().to_string(),
            body: snapshot.bytes().to_vec(),
            modified: runtime.started(),
        })
    };

    match loaded {
        Ok(file) => {
            let last_modified = file.modified;
            respond(request, &file, last_modified)
        }
        Err(e) => error_response(request.uri().path(), &e),
    }
}

fn load_live(asset: &Asset, runtime: &Runtime) -> Result<LoadedFile> {
    let located = runtime.search_path().find_file(asset.source_path())?;
    let body = std::fs::read(&located.path)
        .map_err(|e| Error::from_io(located.path.display().to_string(), e))?;
    Ok(LoadedFile {
        name: asset.name().to_string(),
        body,
        modified: modified_time(&located.path, &located.metadata)?,
    })
}

#[derive(Debug)]
struct LoadedFile {
    name: String,
    body: Vec<u8>,
    modified: SystemTime,
}

fn read_all(file: &mut dyn File, size_hint: u64) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(usize::try_from(size_hint).unwrap_or(0));
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        match file.read(&mut chunk) {
            Ok(0) => return Ok(body),
            Ok(n) => body.extend_from_slice(&chunk[..n]),
            Err(e) if e.is_invalid_state() => return Ok(body),
            Err(e) => return Err(e),
        }
    }
}

fn reject_method(request: &Request<()>) -> Option<Response<Vec<u8>>> {
    if matches!(*request.method(), Method::GET | Method::HEAD) {
        return None;
    }
    Some(finish(
        Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(ALLOW, "GET, HEAD"),
        Vec::new(),
    ))
}

fn error_response(path: &str, error: &Error) -> Response<Vec<u8>> {
    if error.is_not_found() || error.is_invalid_path() {
        debug!(path, "not found");
        return status_only(StatusCode::NOT_FOUND);
    }
    error!(path, error = %error, "failed to serve file");
    status_only(StatusCode::INTERNAL_SERVER_ERROR)
}

fn respond(request: &Request<()>, file: &LoadedFile, last_modified: SystemTime) -> Response<Vec<u8>> {
    let etag = format!("\"{}\"", blake3::hash(&file.body).to_hex());
    let last_modified = DateTime::<Utc>::from(last_modified);
    let headers = request.headers();

    if is_not_modified(headers, &etag, &last_modified) {
        return finish(
            Response::builder()
                .status(StatusCode::NOT_MODIFIED)
                .header(ETAG, etag.as_str())
                .header(LAST_MODIFIED, http_date(&last_modified)),
            Vec::new(),
        );
    }

    let total = file.body.len() as u64;
    let range = headers
        .get(RANGE)
        .and_then(|value| value.to_str().ok())
        .map_or(ByteRange::Full, |value| parse_range(value, total));

    let (status, body, content_range) = match range {
        ByteRange::Full => (StatusCode::OK, file.body.as_slice(), None),
        ByteRange::Partial { start, end } => match slice(&file.body, start, end) {
            Some(part) => (
                StatusCode::PARTIAL_CONTENT,
                part,
                Some(format!("bytes {start}-{end}/{total}")),
            ),
            None => (StatusCode::OK, file.body.as_slice(), None),
        },
        ByteRange::Unsatisfiable => {
            return finish(
                Response::builder()
                    .status(StatusCode::RANGE_NOT_SATISFIABLE)
                    .header(CONTENT_RANGE, format!("bytes */{total}")),
                Vec::new(),
            );
        }
    };

    let content_type = mime_guess::from_path(&file.name).first_or_octet_stream();
    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type.as_ref())
        .header(CONTENT_LENGTH, body.len())
        .header(LAST_MODIFIED, http_date(&last_modified))
        .header(ETAG, etag.as_str())
        .header(ACCEPT_RANGES, "bytes");
    if let Some(content_range) = content_range {
        builder = builder.header(CONTENT_RANGE, content_range);
    }

    let body = if request.method() == Method::HEAD {
        Vec::new()
    } else {
        body.to_vec()
    };
    finish(builder, body)
}

fn is_not_modified(headers: &HeaderMap, etag: &str, last_modified: &DateTime<Utc>) -> bool {
    if let Some(value) = headers.get(IF_NONE_MATCH) {
        // If-None-Match takes precedence over If-Modified-Since
        return value.to_str().is_ok_and(|tags| {
            tags.split(',')
                .map(|tag| tag.trim().trim_start_matches("W/"))
                .any(|tag| tag == "*" || tag == etag)
        });
    }

    headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_http_date)
        .is_some_and(|since| last_modified.timestamp() <= since.timestamp())
}

fn slice(body: &[u8], start: u64, end: u64) -> Option<&[u8]> {
    let start = usize::try_from(start).ok()?;
    let end = usize::try_from(end).ok()?;
    body.get(start..=end)
}

fn status_only(status: StatusCode) -> Response<Vec<u8>> {
    finish(Response::builder().status(status), Vec::new())
}

fn finish(builder: response::Builder, body: Vec<u8>) -> Response<Vec<u8>> {
    builder.body(body).unwrap_or_else(|e| {
        error!(error = %e, "failed to build response");
        let mut response = Response::new(Vec::new());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

/// Formats a timestamp as an RFC 7231 HTTP date.
#[must_use]
pub fn http_date(time: &DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Parses an RFC 7231 HTTP date.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Outcome of interpreting a `Range` header against a body length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// Serve the whole body.
    Full,
    /// Serve the inclusive range `start..=end`.
    Partial {
        /// First byte offset
        start: u64,
        /// Last byte offset, inclusive
        end: u64,
    },
    /// No byte of the requested range exists.
    Unsatisfiable,
}

/// Interprets a `Range` header value for a body of `size` bytes.
///
/// Only a single `bytes=` range is honored; multiple ranges and malformed
/// values fall back to the full body.
///
/// ```
/// use binfs::serve::{ByteRange, parse_range};
///
/// assert_eq!(parse_range("bytes=0-3", 10), ByteRange::Partial { start: 0, end: 3 });
/// assert_eq!(parse_range("bytes=-4", 10), ByteRange::Partial { start: 6, end: 9 });
/// assert_eq!(parse_range("bytes=10-", 10), ByteRange::Unsatisfiable);
/// assert_eq!(parse_range("bytes=0-1,4-5", 10), ByteRange::Full);
/// ```
#[must_use]
pub fn parse_range(header: &str, size: u64) -> ByteRange {
    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return ByteRange::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        let Ok(suffix) = last.parse::<u64>() else {
            return ByteRange::Full;
        };
        if suffix == 0 || size == 0 {
            return ByteRange::Unsatisfiable;
        }
        return ByteRange::Partial {
            start: size - suffix.min(size),
            end: size - 1,
        };
    }

    let Ok(start) = first.parse::<u64>() else {
        return ByteRange::Full;
    };
    if start >= size {
        return ByteRange::Unsatisfiable;
    }

    let end = if last.is_empty() {
        size - 1
    } else {
        match last.parse::<u64>() {
            Ok(end) if end >= start => end.min(size - 1),
            _ => return ByteRange::Full,
        }
    };
    ByteRange::Partial { start, end }
}
