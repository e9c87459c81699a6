//! Streaming run API: emit candidate outcomes as they complete.
//!
//! Unlike the eager [`crate::process::ImagePipeline::run`], which returns
//! only after every image on the page is done, [`run_stream`] yields one
//! `Result<ProcessedImageRecord, Skipped>` per candidate as soon as it
//! finishes. Items arrive in completion order; with `concurrency = 1` that
//! is also page order.

use crate::catalog::CatalogStore;
use crate::config::RunRequest;
use crate::error::{Skipped, WebThumbError};
use crate::output::ProcessedImageRecord;
use crate::pipeline::fetch::ImageFetcher;
use crate::process::ImagePipeline;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-candidate outcomes.
pub type CandidateStream =
    Pin<Box<dyn Stream<Item = Result<ProcessedImageRecord, Skipped>> + Send>>;

/// Process a page, streaming outcomes as they are ready.
///
/// The page is fetched and parsed before this returns, so page-level
/// failures surface here exactly as they do from `run`. Progress callbacks
/// fire per candidate; `on_run_complete` is not emitted since the stream
/// may be dropped part way.
///
/// # Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use std::sync::Arc;
/// use webthumb::{run_stream, ImagePipeline, PipelineConfig, RunRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = Arc::new(ImagePipeline::from_config(PipelineConfig::default()).await?);
/// let request = RunRequest::new("https://example.com/gallery", 100, 100, "")?;
/// let mut outcomes = run_stream(pipeline, request).await?;
/// while let Some(outcome) = outcomes.next().await {
///     match outcome {
///         Ok(record) => println!("stored {}", record.path),
///         Err(skipped) => eprintln!("skipped {skipped}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_stream<F, S>(
    pipeline: Arc<ImagePipeline<F, S>>,
    request: RunRequest,
) -> Result<CandidateStream, WebThumbError>
where
    F: ImageFetcher + 'static,
    S: CatalogStore + 'static,
{
    info!("Starting streaming run: {}", request.page_url());

    let candidates = pipeline.discover(&request).await?;
    let total = candidates.len();
    let concurrency = pipeline.config().concurrency;
    let request = Arc::new(request);

    let s = stream::iter(candidates.into_iter().map(move |candidate| {
        let pipeline = Arc::clone(&pipeline);
        let request = Arc::clone(&request);
        async move {
            pipeline
                .process_with_events(&candidate, &request, total)
                .await
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
