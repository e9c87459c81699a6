//! Eager (whole-page) run entry points.
//!
//! [`ImagePipeline::run`] waits for every candidate on the page and returns
//! a single [`RunOutput`]. Use [`crate::stream::run_stream`] instead to
//! receive outcomes as each candidate finishes.

use crate::catalog::{CatalogConfig, CatalogStore, LocalCatalog};
use crate::config::{PipelineConfig, RunRequest};
use crate::error::{Skipped, WebThumbError};
use crate::output::{CatalogEntry, ProcessedImageRecord, RunOutput, RunStats};
use crate::pipeline::decode::decode_and_validate;
use crate::pipeline::encode::encode_jpeg;
use crate::pipeline::extract::{discover_candidates, CandidateImageRef};
use crate::pipeline::fetch::{HttpFetcher, ImageFetcher};
use crate::pipeline::transform::make_thumbnail;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fetcher, catalog and settings for turning pages into thumbnails.
///
/// The default type parameters are the production pair; tests and embedders
/// can swap either side through [`ImagePipeline::with_parts`].
#[derive(Debug)]
pub struct ImagePipeline<F = HttpFetcher, S = LocalCatalog> {
    fetcher: F,
    catalog: S,
    config: PipelineConfig,
}

impl ImagePipeline<HttpFetcher, LocalCatalog> {
    /// Build the HTTP client and prepare the catalog directory.
    ///
    /// # Errors
    /// * [`WebThumbError::Internal`] — the HTTP client could not be built
    /// * [`WebThumbError::CatalogInit`] — the directory could not be created
    pub async fn from_config(config: PipelineConfig) -> Result<Self, WebThumbError> {
        let fetcher = HttpFetcher::new(config.fetch_timeout_secs, &config.user_agent)
            .map_err(|e| WebThumbError::Internal(format!("HTTP client: {e}")))?;
        let catalog = LocalCatalog::new(CatalogConfig::from(&config));
        catalog.init().await?;
        Ok(Self::with_parts(config, fetcher, catalog))
    }
}

impl<F: ImageFetcher, S: CatalogStore> ImagePipeline<F, S> {
    pub fn with_parts(config: PipelineConfig, fetcher: F, catalog: S) -> Self {
        Self {
            fetcher,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process every image on the request's page.
    ///
    /// # Returns
    /// `Ok(RunOutput)` whenever the page itself was retrieved, even if no
    /// candidate produced a thumbnail (check `output.skipped`).
    ///
    /// # Errors
    /// Only page-level failures are fatal:
    /// [`WebThumbError::PageDownloadFailed`] and
    /// [`WebThumbError::PageDownloadTimeout`].
    pub async fn run(&self, request: &RunRequest) -> Result<RunOutput, WebThumbError> {
        let total_start = Instant::now();

        // ── Step 1: Page → candidates ────────────────────────────────────────
        let page_start = Instant::now();
        let candidates = self.discover(request).await?;
        let page_duration_ms = page_start.elapsed().as_millis() as u64;
        let total = candidates.len();

        // ── Step 2: Candidates → thumbnails ──────────────────────────────────
        let mut outcomes: Vec<(usize, Result<ProcessedImageRecord, Skipped>)> =
            stream::iter(candidates.iter().map(|candidate| async move {
                let outcome = self.process_with_events(candidate, request, total).await;
                (candidate.index, outcome)
            }))
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        // Completion order is arbitrary; restore page order.
        outcomes.sort_by_key(|(index, _)| *index);

        // ── Step 3: Stats ────────────────────────────────────────────────────
        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for (_, outcome) in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(reason) => skipped.push(reason),
            }
        }

        let size_rejected = skipped.iter().filter(|s| s.is_size_rejection()).count();
        let stats = RunStats {
            candidates: total,
            processed: records.len(),
            size_rejected,
            failed: skipped.len() - size_rejected,
            page_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Run complete: {}/{} stored, {} too small, {} failed, {}ms total",
            stats.processed, total, stats.size_rejected, stats.failed, stats.total_duration_ms
        );

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_run_complete(total, records.len());
        }

        Ok(RunOutput {
            records,
            skipped,
            stats,
        })
    }

    /// Every thumbnail in the catalog, newest first.
    pub async fn list(&self) -> Result<Vec<CatalogEntry>, WebThumbError> {
        self.catalog.list().await
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    /// Download the page and extract its resolved `<img>` candidates.
    pub(crate) async fn discover(
        &self,
        request: &RunRequest,
    ) -> Result<Vec<CandidateImageRef>, WebThumbError> {
        let page_url = request.page_url();
        info!("Fetching page {}", page_url);

        let body = self
            .fetcher
            .fetch(page_url.as_str())
            .await
            .map_err(WebThumbError::from_page_fetch)?;
        let markup = String::from_utf8_lossy(&body);
        let candidates = discover_candidates(&markup, page_url);

        info!("Found {} candidate images on {}", candidates.len(), page_url);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_run_start(candidates.len());
        }
        Ok(candidates)
    }

    /// [`Self::process_candidate`] wrapped in progress events and logging.
    pub(crate) async fn process_with_events(
        &self,
        candidate: &CandidateImageRef,
        request: &RunRequest,
        total: usize,
    ) -> Result<ProcessedImageRecord, Skipped> {
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_candidate_start(candidate.index, total);
        }

        let outcome = self.process_candidate(candidate, request).await;
        match &outcome {
            Ok(record) => {
                if let Some(cb) = cb {
                    cb.on_candidate_complete(candidate.index, total, &record.filename);
                }
            }
            Err(reason) => {
                if reason.is_size_rejection() {
                    debug!("Skipped {}", reason);
                } else {
                    warn!("Skipped {}", reason);
                }
                if let Some(cb) = cb {
                    cb.on_candidate_skipped(candidate.index, total, &reason.to_string());
                }
            }
        }
        outcome
    }

    /// Fetch → decode/filter → thumbnail → JPEG → store, for one image.
    async fn process_candidate(
        &self,
        candidate: &CandidateImageRef,
        request: &RunRequest,
    ) -> Result<ProcessedImageRecord, Skipped> {
        let url = candidate.resolved_url.as_str();

        let bytes = self.fetcher.fetch(url).await.map_err(|e| Skipped::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);

        let task_url = url.to_string();
        let (min_width, min_height) = (request.min_width(), request.min_height());
        let overlay_text = request.overlay_text().to_string();
        let quality = self.config.jpeg_quality;

        // Decode, resize and encode are CPU-bound.
        let jpeg = tokio::task::spawn_blocking(move || {
            render_thumbnail(&bytes, min_width, min_height, &overlay_text, quality, &task_url)
        })
        .await
        .map_err(|e| Skipped::Internal {
            url: url.to_string(),
            detail: format!("thumbnail task failed: {e}"),
        })??;

        self.catalog
            .store(&jpeg, url, request.overlay_text())
            .await
            .map_err(|e| Skipped::Persist {
                url: url.to_string(),
                detail: e.to_string(),
            })
    }
}

/// The blocking part of a candidate: bytes in, JPEG bytes out.
fn render_thumbnail(
    bytes: &[u8],
    min_width: u32,
    min_height: u32,
    overlay_text: &str,
    quality: u8,
    url: &str,
) -> Result<Vec<u8>, Skipped> {
    let raster = decode_and_validate(bytes, min_width, min_height)
        .map_err(|e| Skipped::UnsupportedFormat {
            url: url.to_string(),
            detail: e.detail,
        })?
        .ok_or_else(|| Skipped::SizeRejected {
            url: url.to_string(),
            min_width,
            min_height,
        })?;

    let thumbnail = make_thumbnail(raster, overlay_text);
    encode_jpeg(&thumbnail, quality).map_err(|e| Skipped::EncodeFailed {
        url: url.to_string(),
        detail: e.to_string(),
    })
}

/// Process one page with a freshly built [`ImagePipeline`].
///
/// # Example
/// ```rust,no_run
/// use webthumb::{run, PipelineConfig, RunRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let request = RunRequest::new("https://example.com/gallery", 100, 100, "SALE")?;
/// let output = run(&request, &PipelineConfig::default()).await?;
/// for record in &output.records {
///     println!("{} ← {}", record.path, record.original_url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run(request: &RunRequest, config: &PipelineConfig) -> Result<RunOutput, WebThumbError> {
    ImagePipeline::from_config(config.clone())
        .await?
        .run(request)
        .await
}

/// List the catalog described by `config`.
///
/// Does not create the directory; a missing one lists as empty.
pub async fn list(config: &PipelineConfig) -> Result<Vec<CatalogEntry>, WebThumbError> {
    LocalCatalog::new(CatalogConfig::from(config)).list().await
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
///
/// # Example
/// ```rust,no_run
/// use webthumb::{run_sync, PipelineConfig, RunRequest};
///
/// let request = RunRequest::new("https://example.com/gallery", 100, 100, "")?;
/// let output = run_sync(&request, &PipelineConfig::default())?;
/// println!("Processed images: {}", output.records.len());
/// # Ok::<(), webthumb::WebThumbError>(())
/// ```
pub fn run_sync(request: &RunRequest, config: &PipelineConfig) -> Result<RunOutput, WebThumbError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| WebThumbError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(request, config))
}
