//! Integration tests for webthumb.
//!
//! Every test runs the real pipeline (extract, resolve, decode, thumbnail,
//! encode, catalog) against an in-memory fetcher and a scratch directory, so
//! nothing here touches the network.
//!
//! Run with:
//!   cargo test --test pipeline -- --nocapture

use futures::StreamExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use webthumb::{
    run_stream, CatalogConfig, CatalogEntry, CatalogStore, FetchError, ImageFetcher,
    ImagePipeline, LocalCatalog, PersistError, PipelineConfig, ProcessedImageRecord,
    RunProgressCallback, RunRequest, Skipped, WebThumbError,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

const PAGE_URL: &str = "https://example.com/gallery";

/// Serves canned bodies by URL; anything else is a 404.
#[derive(Default)]
struct MemoryFetcher {
    bodies: HashMap<String, Vec<u8>>,
    delays: HashMap<String, Duration>,
    requests: AtomicUsize,
}

impl MemoryFetcher {
    fn with(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    fn delayed(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }
}

impl ImageFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// A [`LocalCatalog`] whose `n`-th store call (0-based) fails.
struct FailingStore {
    inner: LocalCatalog,
    fail_on: usize,
    calls: AtomicUsize,
}

impl CatalogStore for FailingStore {
    async fn store(
        &self,
        jpeg: &[u8],
        original_url: &str,
        overlay_text: &str,
    ) -> Result<ProcessedImageRecord, PersistError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_on {
            return Err(PersistError {
                path: self.inner.dir().join("processed_failed.jpg"),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.store(jpeg, original_url, overlay_text).await
    }

    async fn list(&self) -> Result<Vec<CatalogEntry>, WebThumbError> {
        self.inner.list().await
    }
}

#[derive(Default)]
struct CountingCallback {
    started: AtomicUsize,
    completed: AtomicUsize,
    skipped: AtomicUsize,
    finished: AtomicUsize,
}

impl RunProgressCallback for CountingCallback {
    fn on_run_start(&self, total_candidates: usize) {
        self.started.store(total_candidates, Ordering::SeqCst);
    }
    fn on_candidate_complete(&self, _index: usize, _total: usize, _filename: &str) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_candidate_skipped(&self, _index: usize, _total: usize, _reason: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }
    fn on_run_complete(&self, _total: usize, success_count: usize) {
        self.finished.store(success_count, Ordering::SeqCst);
    }
}

fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([128, 128, 128])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("fixture encodes");
    buf
}

fn page(srcs: &[&str]) -> Vec<u8> {
    let imgs: String = srcs
        .iter()
        .map(|s| format!("<div><img src=\"{s}\"></div>\n"))
        .collect();
    format!("<html><head><title>t</title></head><body>\n{imgs}</body></html>").into_bytes()
}

fn config(dir: &Path, concurrency: usize) -> PipelineConfig {
    PipelineConfig::builder()
        .processed_dir(dir)
        .concurrency(concurrency)
        .build()
        .unwrap()
}

async fn local_catalog(dir: &Path) -> LocalCatalog {
    let catalog = LocalCatalog::new(CatalogConfig {
        processed_dir: dir.to_path_buf(),
        public_prefix: "/processed-images".into(),
    });
    catalog.init().await.unwrap();
    catalog
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn gallery_keeps_large_image_and_drops_tiny_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("processed");
    let fetcher = MemoryFetcher::default()
        .with(PAGE_URL, page(&["/a.jpg", "tiny.gif"]))
        .with("https://example.com/a.jpg", encoded(300, 300, ImageFormat::Jpeg))
        .with("https://example.com/tiny.gif", encoded(10, 10, ImageFormat::Gif));
    let pipeline = ImagePipeline::with_parts(config(&dir, 4), fetcher, local_catalog(&dir).await);

    let request = RunRequest::new(PAGE_URL, 100, 100, "SALE").unwrap();
    let output = pipeline.run(&request).await.unwrap();

    assert_eq!(output.records.len(), 1, "skipped: {:?}", output.skipped);
    let record = &output.records[0];
    assert_eq!(record.original_url, "https://example.com/a.jpg");
    assert_eq!(record.overlay_text, "SALE");
    assert!(record.filename.starts_with("processed_") && record.filename.ends_with(".jpg"));
    assert_eq!(record.path, format!("/processed-images/{}", record.filename));

    assert_eq!(
        output.skipped,
        vec![Skipped::SizeRejected {
            url: "https://example.com/tiny.gif".into(),
            min_width: 100,
            min_height: 100,
        }]
    );
    assert_eq!(output.stats.candidates, 2);
    assert_eq!(output.stats.processed, 1);
    assert_eq!(output.stats.size_rejected, 1);
    assert_eq!(output.stats.failed, 0);

    // Stored file is a 200×200 JPEG with a light caption and dark shadow
    // near the center, on a mid-grey background.
    let stored = std::fs::read(dir.join(&record.filename)).unwrap();
    assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Jpeg);
    let thumb = image::load_from_memory(&stored).unwrap().to_rgb8();
    assert_eq!(thumb.dimensions(), (200, 200));

    let (mut bright, mut dark) = (0, 0);
    for y in 88..112 {
        for x in 60..140 {
            let Rgb([r, g, b]) = *thumb.get_pixel(x, y);
            if r > 200 && g > 200 && b > 200 {
                bright += 1;
            } else if r < 90 && g < 90 && b < 90 {
                dark += 1;
            }
        }
    }
    assert!(bright > 20, "bright caption pixels: {bright}");
    assert!(dark > 5, "dark shadow pixels: {dark}");

    let corner = thumb.get_pixel(5, 5);
    assert!((100..160).contains(&corner[0]), "background: {corner:?}");
}

#[tokio::test]
async fn page_fetch_failure_is_fatal_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("processed");
    let pipeline = ImagePipeline::with_parts(
        config(&dir, 4),
        MemoryFetcher::default(),
        local_catalog(&dir).await,
    );

    let request = RunRequest::new(PAGE_URL, 100, 100, "").unwrap();
    let err = pipeline.run(&request).await.unwrap_err();

    match err {
        WebThumbError::PageDownloadFailed { url, reason } => {
            assert_eq!(url, PAGE_URL);
            assert!(reason.contains("404"), "reason: {reason}");
        }
        other => panic!("expected PageDownloadFailed, got {other:?}"),
    }
    assert!(files_in(&dir).is_empty());
}

#[tokio::test]
async fn one_persist_failure_keeps_the_other_records() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("processed");
    let fetcher = MemoryFetcher::default()
        .with(PAGE_URL, page(&["/1.png", "/2.png", "/3.png"]))
        .with("https://example.com/1.png", encoded(300, 300, ImageFormat::Png))
        .with("https://example.com/2.png", encoded(300, 300, ImageFormat::Png))
        .with("https://example.com/3.png", encoded(300, 300, ImageFormat::Png));
    let store = FailingStore {
        inner: local_catalog(&dir).await,
        fail_on: 1,
        calls: AtomicUsize::new(0),
    };
    let pipeline = ImagePipeline::with_parts(config(&dir, 1), fetcher, store);

    let request = RunRequest::new(PAGE_URL, 100, 100, "").unwrap();
    let output = pipeline.run(&request).await.unwrap();

    assert_eq!(output.records.len(), 2);
    assert_eq!(output.skipped.len(), 1);
    assert!(
        matches!(&output.skipped[0], Skipped::Persist { detail, .. } if detail.contains("disk full")),
        "got: {:?}",
        output.skipped
    );
    assert_eq!(output.stats.failed, 1);
    assert_eq!(files_in(&dir).len(), 2);
}

#[tokio::test]
async fn records_follow_page_order_under_concurrency() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("processed");
    let srcs = ["/slow.png", "/b.png", "/c.png", "/d.png"];
    let mut fetcher = MemoryFetcher::default().with(PAGE_URL, page(&srcs));
    for src in srcs {
        fetcher = fetcher.with(
            &format!("https://example.com{src}"),
            encoded(240, 240, ImageFormat::Png),
        );
    }
    let fetcher = fetcher.delayed("https://example.com/slow.png", Duration::from_millis(300));
    let pipeline = ImagePipeline::with_parts(config(&dir, 4), fetcher, local_catalog(&dir).await);

    let request = RunRequest::new(PAGE_URL, 100, 100, "").unwrap();
    let output = pipeline.run(&request).await.unwrap();

    let urls: Vec<&str> = output.records.iter().map(|r| r.original_url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://example.com/slow.png",
            "https://example.com/b.png",
            "https://example.com/c.png",
            "https://example.com/d.png",
        ]
    );
}

#[tokio::test]
async fn bad_candidates_are_skipped_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("processed");
    let fetcher = MemoryFetcher::default()
        .with(PAGE_URL, page(&["/missing.jpg", "/not-an-image.jpg", ""]))
        .with(
            "https://example.com/not-an-image.jpg",
            b"<html>login required</html>".to_vec(),
        );
    let pipeline = ImagePipeline::with_parts(config(&dir, 2), fetcher, local_catalog(&dir).await);

    let request = RunRequest::new(PAGE_URL, 1, 1, "").unwrap();
    let output = pipeline.run(&request).await.unwrap();

    assert!(output.is_empty());
    // The empty src never becomes a candidate.
    assert_eq!(output.stats.candidates, 2);
    assert!(matches!(output.skipped[0], Skipped::Fetch { .. }));
    assert!(matches!(output.skipped[1], Skipped::UnsupportedFormat { .. }));
    assert_eq!(output.skipped[1].url(), "https://example.com/not-an-image.jpg");
    assert!(files_in(&dir).is_empty());
}

#[tokio::test]
async fn page_without_images_is_an_empty_success() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("processed");
    let fetcher =
        MemoryFetcher::default().with(PAGE_URL, b"<p>no pictures <b>here".to_vec());
    let pipeline = ImagePipeline::with_parts(config(&dir, 4), fetcher, local_catalog(&dir).await);

    let request = RunRequest::new(PAGE_URL, 100, 100, "").unwrap();
    let output = pipeline.run(&request).await.unwrap();
    assert!(output.is_empty());
    assert!(output.skipped.is_empty());
    assert_eq!(output.stats.candidates, 0);
}

#[tokio::test]
async fn listing_is_stable_and_matches_stored_records() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("processed");
    let fetcher = MemoryFetcher::default()
        .with(PAGE_URL, page(&["/a.jpg", "https://cdn.example.net/b.webp"]))
        .with("https://example.com/a.jpg", encoded(300, 200, ImageFormat::Jpeg))
        .with("https://cdn.example.net/b.webp", encoded(150, 400, ImageFormat::WebP));
    let pipeline = ImagePipeline::with_parts(config(&dir, 2), fetcher, local_catalog(&dir).await);

    let request = RunRequest::new(PAGE_URL, 100, 100, "").unwrap();
    let output = pipeline.run(&request).await.unwrap();
    assert_eq!(output.records.len(), 2);

    let first = pipeline.list().await.unwrap();
    let second = pipeline.list().await.unwrap();
    assert_eq!(first, second);

    let mut listed: Vec<&str> = first.iter().map(|e| e.filename.as_str()).collect();
    let mut stored: Vec<&str> = output.records.iter().map(|r| r.filename.as_str()).collect();
    listed.sort();
    stored.sort();
    assert_eq!(listed, stored);
    assert!(first.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn progress_callback_sees_every_candidate() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("processed");
    let fetcher = MemoryFetcher::default()
        .with(PAGE_URL, page(&["/a.jpg", "tiny.gif", "/gone.png"]))
        .with("https://example.com/a.jpg", encoded(300, 300, ImageFormat::Jpeg))
        .with("https://example.com/tiny.gif", encoded(10, 10, ImageFormat::Gif));
    let counter = Arc::new(CountingCallback::default());
    let config = PipelineConfig::builder()
        .processed_dir(&dir)
        .progress_callback(counter.clone() as Arc<dyn RunProgressCallback>)
        .build()
        .unwrap();
    let pipeline = ImagePipeline::with_parts(config, fetcher, local_catalog(&dir).await);

    let request = RunRequest::new(PAGE_URL, 100, 100, "").unwrap();
    pipeline.run(&request).await.unwrap();

    assert_eq!(counter.started.load(Ordering::SeqCst), 3);
    assert_eq!(counter.completed.load(Ordering::SeqCst), 1);
    assert_eq!(counter.skipped.load(Ordering::SeqCst), 2);
    assert_eq!(counter.finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stream_yields_one_outcome_per_candidate() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("processed");
    let fetcher = MemoryFetcher::default()
        .with(PAGE_URL, page(&["/a.jpg", "tiny.gif"]))
        .with("https://example.com/a.jpg", encoded(300, 300, ImageFormat::Jpeg))
        .with("https://example.com/tiny.gif", encoded(10, 10, ImageFormat::Gif));
    let pipeline = Arc::new(ImagePipeline::with_parts(
        config(&dir, 2),
        fetcher,
        local_catalog(&dir).await,
    ));

    let request = RunRequest::new(PAGE_URL, 100, 100, "").unwrap();
    let outcomes: Vec<_> = run_stream(pipeline, request).await.unwrap().collect().await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, Err(s) if s.is_size_rejection())));
}

#[tokio::test]
async fn stream_fails_fast_on_page_error() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("processed");
    let pipeline = Arc::new(ImagePipeline::with_parts(
        config(&dir, 2),
        MemoryFetcher::default(),
        local_catalog(&dir).await,
    ));

    let request = RunRequest::new(PAGE_URL, 100, 100, "").unwrap();
    let result = run_stream(pipeline, request).await;
    assert!(matches!(result, Err(WebThumbError::PageDownloadFailed { .. })));
}

#[test]
fn invalid_requests_fail_before_any_fetch() {
    for (url, w, h) in [("", 100, 100), ("not a url", 100, 100), (PAGE_URL, 0, 100)] {
        let err = RunRequest::new(url, w, h, "").unwrap_err();
        assert!(
            matches!(err, WebThumbError::InvalidInput { .. }),
            "{url:?} {w}x{h}: {err:?}"
        );
    }
}
