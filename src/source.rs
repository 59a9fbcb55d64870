//! Byte range access to local files and HTTP resources.
//!
//! Every fetch returns exactly the requested inclusive span or fails. There is
//! no retry and nothing is cached; a short read is always an error.

use bytes::Bytes;
use camhd_media::ByteSpan;
use reqwest::blocking::Client;
use reqwest::header::RANGE;
use reqwest::{StatusCode, Url};
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::{Error, Result};

/// Body read granularity; the cancel flag is checked between reads.
const READ_CHUNK: usize = 64 * 1024;

/// Upper bound on the body buffer reserved before any bytes arrive.
const PREALLOC_LIMIT: usize = 8 * 1024 * 1024;

/// Where a recording lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    Local(PathBuf),
    Remote(Url),
}

impl Source {
    /// Classify `s`: `http://` and `https://` are remote, anything else a path.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_source("empty source"));
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(trimmed)
                .map_err(|e| Error::invalid_source(format!("{}: {}", trimmed, e)))?;
            Ok(Self::Remote(url))
        } else {
            Ok(Self::Local(PathBuf::from(trimmed)))
        }
    }

    /// Last path segment up to its first `.`, e.g. `CAMHDA301-20161113T000000Z`.
    pub fn file_stem(&self) -> String {
        let name = match self {
            Self::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Self::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or_default()
                .to_string(),
        };
        name.split('.').next().unwrap_or_default().to_string()
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Per-call timeout and cancellation for one fetch.
///
/// Cloning shares the cancel flag, so one flag can stop a group of fetches.
#[derive(Debug, Clone, Default)]
pub struct FetchSignal {
    timeout: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl FetchSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the client-wide timeout for this fetch (HTTP only).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fetch is abandoned once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Uniform exact byte range access.
pub trait ByteRangeSource: Send + Sync {
    /// The recording this source reads.
    fn location(&self) -> &Source;

    /// Fetch `span` honouring `signal`.
    fn fetch_with(&self, span: ByteSpan, signal: &FetchSignal) -> Result<Bytes>;

    /// Fetch `span` with no extra timeout or cancellation.
    fn fetch(&self, span: ByteSpan) -> Result<Bytes> {
        self.fetch_with(span, &FetchSignal::default())
    }

    /// Fetch the inclusive range `[start, end_inclusive]`.
    fn fetch_range(&self, start: u64, end_inclusive: u64) -> Result<Bytes> {
        let span = ByteSpan::new(start, end_inclusive).ok_or_else(|| {
            Error::invalid_source(format!(
                "range end {} precedes start {}",
                end_inclusive, start
            ))
        })?;
        self.fetch(span)
    }
}

/// Create the right source for `source`.
pub fn create_source(source: &Source, http: &HttpConfig) -> Result<Arc<dyn ByteRangeSource>> {
    match source {
        Source::Local(path) => Ok(Arc::new(LocalFile::new(path))),
        Source::Remote(url) => Ok(Arc::new(HttpSource::new(url.clone(), http)?)),
    }
}

/// A file on the local filesystem.
///
/// Each fetch opens its own handle, so fetches never share a file cursor.
#[derive(Debug, Clone)]
pub struct LocalFile {
    source: Source,
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            source: Source::Local(path.clone()),
            path,
        }
    }

    fn unavailable(&self, span: ByteSpan, err: io::Error) -> Error {
        let reason = match err.kind() {
            io::ErrorKind::UnexpectedEof => format!("short read: fewer than {} bytes", span.len()),
            _ => err.to_string(),
        };
        Error::range_unavailable(self.source.to_string(), span, reason)
    }
}

impl ByteRangeSource for LocalFile {
    fn location(&self) -> &Source {
        &self.source
    }

    fn fetch_with(&self, span: ByteSpan, signal: &FetchSignal) -> Result<Bytes> {
        if signal.is_cancelled() {
            return Err(Error::Cancelled {
                location: self.source.to_string(),
                span,
            });
        }

        tracing::debug!(path = %self.path.display(), range = %span, "reading local range");

        let len = usize::try_from(span.len()).map_err(|_| {
            Error::range_unavailable(self.source.to_string(), span, "range exceeds address space")
        })?;

        let mut file = File::open(&self.path).map_err(|e| self.unavailable(span, e))?;
        let file_len = file
            .metadata()
            .map_err(|e| self.unavailable(span, e))?
            .len();
        if span.end >= file_len {
            return Err(Error::range_unavailable(
                self.source.to_string(),
                span,
                format!("short read: range ends past end of file ({} bytes)", file_len),
            ));
        }

        file.seek(SeekFrom::Start(span.start))
            .map_err(|e| self.unavailable(span, e))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)
            .map_err(|e| self.unavailable(span, e))?;

        Ok(Bytes::from(buf))
    }
}

/// A resource served over HTTP(S) that honours `Range` requests.
#[derive(Debug, Clone)]
pub struct HttpSource {
    source: Source,
    url: Url,
    client: Client,
}

impl HttpSource {
    /// Build a client configured from `config`.
    ///
    /// Must not be called from inside an async runtime.
    pub fn new(url: Url, config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            source: Source::Remote(url.clone()),
            url,
            client,
        })
    }

    fn unavailable(&self, span: ByteSpan, reason: impl Into<String>) -> Error {
        Error::range_unavailable(self.url.to_string(), span, reason)
    }

    fn cancelled(&self, span: ByteSpan) -> Error {
        Error::Cancelled {
            location: self.url.to_string(),
            span,
        }
    }
}

impl ByteRangeSource for HttpSource {
    fn location(&self) -> &Source {
        &self.source
    }

    fn fetch_with(&self, span: ByteSpan, signal: &FetchSignal) -> Result<Bytes> {
        if signal.is_cancelled() {
            return Err(self.cancelled(span));
        }

        tracing::debug!(url = %self.url, range = %span, "requesting remote range");

        let mut request = self
            .client
            .get(self.url.clone())
            .header(RANGE, format!("bytes={}", span));
        if let Some(timeout) = signal.timeout() {
            request = request.timeout(timeout);
        }

        let response = request.send().map_err(|e| {
            let reason = if e.is_timeout() {
                format!("request timed out: {}", e)
            } else {
                format!("request failed: {}", e)
            };
            self.unavailable(span, reason)
        })?;

        let status = response.status();
        match status {
            StatusCode::PARTIAL_CONTENT => {}
            // Range ignored: the body starts at byte 0, usable only if we asked for it.
            StatusCode::OK if span.start == 0 => {}
            _ => {
                return Err(self.unavailable(span, format!("unexpected status {}", status)));
            }
        }
        let whole_body = status == StatusCode::OK;

        let expected = usize::try_from(span.len())
            .map_err(|_| self.unavailable(span, "range exceeds address space"))?;
        let mut body = Vec::with_capacity(expected.min(PREALLOC_LIMIT));
        let mut reader = response.take(span.len() + 1);
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            if signal.is_cancelled() {
                return Err(self.cancelled(span));
            }
            let n = reader.read(&mut chunk).map_err(|e| {
                let reason = if e.kind() == io::ErrorKind::TimedOut {
                    format!("body read timed out: {}", e)
                } else {
                    format!("body read failed: {}", e)
                };
                self.unavailable(span, reason)
            })?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }

        if whole_body && body.len() > expected {
            body.truncate(expected);
        }

        if body.len() != expected {
            return Err(self.unavailable(
                span,
                format!("expected {} bytes, received {}", expected, body.len()),
            ));
        }

        Ok(Bytes::from(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse() {
        let remote = Source::parse(
            "https://rawdata.oceanobservatories.org/files/RS03ASHS/PN03B/06-CAMHDA301/2016/11/13/CAMHDA301-20161113T000000Z.mov",
        )
        .unwrap();
        assert!(remote.is_remote());
        assert_eq!(remote.file_stem(), "CAMHDA301-20161113T000000Z");

        let local = Source::parse("/data/camhd/CAMHDA301-20150709T121400Z.mov").unwrap();
        assert_eq!(
            local,
            Source::Local(PathBuf::from("/data/camhd/CAMHDA301-20150709T121400Z.mov"))
        );
        assert_eq!(local.file_stem(), "CAMHDA301-20150709T121400Z");

        let multi_dot: Source = "CAMHDA301-20161120T180000Z.camhd_prores_001744.mov"
            .parse()
            .unwrap();
        assert_eq!(multi_dot.file_stem(), "CAMHDA301-20161120T180000Z");

        assert!(Source::parse("   ").is_err());
        assert!(Source::parse("http://").is_err());
    }

    #[test]
    fn test_fetch_signal() {
        let flag = Arc::new(AtomicBool::new(false));
        let signal = FetchSignal::new()
            .with_timeout(Duration::from_secs(2))
            .with_cancel(flag.clone());
        assert_eq!(signal.timeout(), Some(Duration::from_secs(2)));
        assert!(!signal.is_cancelled());

        let shared = signal.clone();
        flag.store(true, Ordering::Relaxed);
        assert!(signal.is_cancelled());
        assert!(shared.is_cancelled());
        assert!(!FetchSignal::default().is_cancelled());
    }
}
