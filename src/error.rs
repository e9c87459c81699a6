//! Error types for the webthumb library.
//!
//! Two distinct layers reflect two distinct failure modes:
//!
//! * [`WebThumbError`] — **Fatal**: the run cannot proceed at all (bad
//!   request parameters, the page itself could not be downloaded, the
//!   catalog directory is unusable). Returned as `Err(WebThumbError)` from
//!   [`crate::ImagePipeline::run`] before any thumbnail is written.
//!
//! * [`Skipped`] — **Non-fatal**: one candidate image was dropped (fetch
//!   failed, unsupported encoding, too small, could not be written) while
//!   every other candidate carries on. Collected into
//!   [`crate::output::RunOutput::skipped`] so callers can see why an image
//!   is missing instead of losing the whole page to one bad `<img>`.
//!
//! Each pipeline stage has its own small error ([`FetchError`],
//! [`UnsupportedFormat`], [`PersistError`]); the orchestrator maps them onto
//! the two layers above depending on whether the page or a candidate failed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the webthumb library.
#[derive(Debug, Error)]
pub enum WebThumbError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Request parameters were rejected before any network work.
    #[error("Invalid request '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// The page URL was valid but could not be downloaded.
    #[error("Failed to download page '{url}': {reason}\nCheck the URL and your internet connection.")]
    PageDownloadFailed { url: String, reason: String },

    /// The page download exceeded the configured timeout.
    #[error("Page download timed out after {secs}s for '{url}'\nIncrease --timeout.")]
    PageDownloadTimeout { url: String, secs: u64 },

    // ── Catalog errors ────────────────────────────────────────────────────
    /// The processed-images directory could not be created.
    #[error("Failed to prepare catalog directory '{path}': {source}")]
    CatalogInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The processed-images directory exists but could not be scanned.
    #[error("Failed to read catalog directory '{path}': {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebThumbError {
    /// Shorthand for [`WebThumbError::InvalidInput`].
    pub(crate) fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        WebThumbError::InvalidInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Promote a fetch failure of the page itself to a fatal error.
    pub(crate) fn from_page_fetch(err: FetchError) -> Self {
        match err {
            FetchError::Timeout { url, secs } => WebThumbError::PageDownloadTimeout { url, secs },
            FetchError::HttpStatus { url, status } => WebThumbError::PageDownloadFailed {
                url,
                reason: format!("HTTP {status}"),
            },
            FetchError::Transport { url, reason } => {
                WebThumbError::PageDownloadFailed { url, reason }
            }
        }
    }
}

/// Transport-level failure while retrieving a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("request to '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The server answered with a non-2xx status.
    #[error("'{url}' returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// Connection, TLS, body or URL-syntax failure.
    #[error("request to '{url}' failed: {reason}")]
    Transport { url: String, reason: String },
}

/// The fetched bytes are not a decodable JPEG, PNG, GIF or WebP image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported image: {detail}")]
pub struct UnsupportedFormat {
    pub detail: String,
}

impl UnsupportedFormat {
    pub(crate) fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// A thumbnail could not be written to the catalog directory.
#[derive(Debug, Error)]
#[error("failed to write '{path}': {source}")]
pub struct PersistError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Why a single candidate image produced no thumbnail.
///
/// Stored in [`crate::output::RunOutput::skipped`]; the run itself
/// continues with the remaining candidates.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Skipped {
    /// Network failure, timeout or non-2xx response for the image URL.
    #[error("{url}: fetch failed: {reason}")]
    Fetch { url: String, reason: String },

    /// Bytes were not one of the four supported encodings, or were corrupt.
    #[error("{url}: {detail}")]
    UnsupportedFormat { url: String, detail: String },

    /// Image decoded fine but is smaller than the requested minimum.
    #[error("{url}: smaller than {min_width}x{min_height}")]
    SizeRejected {
        url: String,
        min_width: u32,
        min_height: u32,
    },

    /// The thumbnail could not be JPEG-encoded.
    #[error("{url}: JPEG encoding failed: {detail}")]
    EncodeFailed { url: String, detail: String },

    /// The thumbnail could not be written to the catalog.
    #[error("{url}: persist failed: {detail}")]
    Persist { url: String, detail: String },

    /// A worker task panicked or was cancelled.
    #[error("{url}: internal error: {detail}")]
    Internal { url: String, detail: String },
}

impl Skipped {
    /// The resolved URL of the candidate that was skipped.
    pub fn url(&self) -> &str {
        match self {
            Skipped::Fetch { url, .. }
            | Skipped::UnsupportedFormat { url, .. }
            | Skipped::SizeRejected { url, .. }
            | Skipped::EncodeFailed { url, .. }
            | Skipped::Persist { url, .. }
            | Skipped::Internal { url, .. } => url,
        }
    }

    /// `true` for the filtering outcome, which is not a failure at all.
    pub fn is_size_rejection(&self) -> bool {
        matches!(self, Skipped::SizeRejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_timeout_becomes_fatal_timeout() {
        let e = WebThumbError::from_page_fetch(FetchError::Timeout {
            url: "https://example.com/".into(),
            secs: 30,
        });
        assert!(matches!(e, WebThumbError::PageDownloadTimeout { secs: 30, .. }));
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn page_status_becomes_download_failed() {
        let e = WebThumbError::from_page_fetch(FetchError::HttpStatus {
            url: "https://example.com/".into(),
            status: 404,
        });
        let msg = e.to_string();
        assert!(msg.contains("HTTP 404"), "got: {msg}");
        assert!(msg.contains("https://example.com/"), "got: {msg}");
    }

    #[test]
    fn skipped_display_names_url() {
        let s = Skipped::SizeRejected {
            url: "https://example.com/tiny.gif".into(),
            min_width: 100,
            min_height: 100,
        };
        assert!(s.to_string().contains("tiny.gif"));
        assert!(s.to_string().contains("100x100"));
        assert!(s.is_size_rejection());
        assert_eq!(s.url(), "https://example.com/tiny.gif");
    }

    #[test]
    fn skipped_serialises_with_kind_tag() {
        let s = Skipped::Persist {
            url: "https://example.com/a.jpg".into(),
            detail: "disk full".into(),
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["kind"], "persist");
        assert_eq!(json["detail"], "disk full");
    }

    #[test]
    fn persist_error_keeps_io_source() {
        use std::error::Error as _;
        let e = PersistError {
            path: PathBuf::from("/nope/processed_x.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("processed_x.jpg"));
        assert!(e.source().is_some());
    }
}
