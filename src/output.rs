//! Result types returned by a run and by a catalog listing.

use crate::error::Skipped;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One thumbnail written during a run.
///
/// Only the run that produced it knows `original_url` and `overlay_text`;
/// a later [`crate::ImagePipeline::list`] rebuilds a [`CatalogEntry`] from
/// the directory alone and cannot recover them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedImageRecord {
    /// `processed_<token>.jpg`
    pub filename: String,
    /// Public path, e.g. `/processed-images/processed_<token>.jpg`.
    pub path: String,
    /// Absolute URL the source image was fetched from.
    pub original_url: String,
    /// Caption stamped on the thumbnail; empty when none was requested.
    pub overlay_text: String,
    /// Local time the file was persisted.
    pub created_at: DateTime<Local>,
}

/// A listing view of one file in the catalog directory.
///
/// `created_at` is the file's modification time, not the value recorded at
/// processing time; the two drift apart if the file is touched externally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub filename: String,
    pub path: String,
    pub created_at: DateTime<Local>,
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Resolved `<img>` candidates discovered on the page.
    pub candidates: usize,
    /// Thumbnails successfully written.
    pub processed: usize,
    /// Candidates filtered out for being under the minimum size.
    pub size_rejected: usize,
    /// Candidates dropped for any other reason.
    pub failed: usize,
    /// Time spent downloading and parsing the page.
    pub page_duration_ms: u64,
    /// Wall-clock time of the whole run.
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// Stored thumbnails, in the order their `<img>` tags appear on the page.
    pub records: Vec<ProcessedImageRecord>,
    /// Candidates that produced no thumbnail, also in page order.
    pub skipped: Vec<Skipped>,
    pub stats: RunStats,
}

impl RunOutput {
    /// `true` when not a single thumbnail was written. Not an error.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
