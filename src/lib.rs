//! # webthumb
//!
//! Turn the images of a web page into uniform, optionally captioned,
//! 200×200 JPEG thumbnails, and keep them in a browsable catalog.
//!
//! ## Pipeline Overview
//!
//! ```text
//! page URL
//!  │
//!  ├─ 1. Fetch     download the HTML (fatal on failure)
//!  ├─ 2. Extract   every <img src>, in document order
//!  ├─ 3. Resolve   relative sources → absolute URLs on the page origin
//!  ├─ 4. Fetch     each image, bounded concurrency
//!  ├─ 5. Filter    sniff format + header size; undersized images are skipped
//!  ├─ 6. Thumbnail resize to 200 px high, center-crop, caption (spawn_blocking)
//!  ├─ 7. Encode    JPEG, quality 90
//!  └─ 8. Catalog   processed_<token>.jpg, atomically renamed into place
//! ```
//!
//! A bad image never aborts the page: each candidate ends up either as a
//! [`ProcessedImageRecord`] or as a [`Skipped`] reason in the [`RunOutput`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use webthumb::{ImagePipeline, PipelineConfig, RunRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = ImagePipeline::from_config(PipelineConfig::default()).await?;
//!     let request = RunRequest::new("https://example.com/gallery", 100, 100, "SALE")?;
//!     let output = pipeline.run(&request).await?;
//!     println!("Processed images: {}", output.records.len());
//!
//!     for entry in pipeline.list().await? {
//!         println!("{}  {}", entry.created_at, entry.path);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `webthumb` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! webthumb = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::{CatalogConfig, CatalogStore, LocalCatalog};
pub use config::{PipelineConfig, PipelineConfigBuilder, RunRequest, THUMBNAIL_SIZE};
pub use error::{FetchError, PersistError, Skipped, UnsupportedFormat, WebThumbError};
pub use output::{CatalogEntry, ProcessedImageRecord, RunOutput, RunStats};
pub use pipeline::fetch::{HttpFetcher, ImageFetcher};
pub use process::{list, run, run_sync, ImagePipeline};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use stream::{run_stream, CandidateStream};
