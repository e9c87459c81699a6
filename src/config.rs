//! Configuration types for a thumbnail run.
//!
//! Two structs split the knobs by lifetime:
//!
//! * [`PipelineConfig`] — process-wide settings (where thumbnails go, HTTP
//!   timeout, concurrency), built once via [`PipelineConfigBuilder`].
//! * [`RunRequest`] — the per-call parameters (page URL, minimum size,
//!   caption), validated on construction so a bad request fails before any
//!   network work.

use crate::error::WebThumbError;
use crate::progress::ProgressCallback;
use reqwest::Url;
use std::fmt;
use std::path::PathBuf;

/// Edge length of every stored thumbnail, in pixels.
pub const THUMBNAIL_SIZE: u32 = 200;

/// Default directory thumbnails are written to.
pub const DEFAULT_PROCESSED_DIR: &str = "public/processed-images";

/// Default public prefix of the `path` field of records and entries.
pub const DEFAULT_PUBLIC_PREFIX: &str = "/processed-images";

/// Process-wide configuration of the thumbnail pipeline.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use webthumb::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .processed_dir("/srv/www/public/processed-images")
///     .concurrency(8)
///     .fetch_timeout_secs(10)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Directory thumbnails are written to and listed from.
    /// Default: `public/processed-images`.
    pub processed_dir: PathBuf,

    /// Prefix joined with the filename to form `path` in records and listing
    /// entries. Default: `/processed-images`.
    pub public_prefix: String,

    /// Candidates processed at once. Default: 4.
    ///
    /// `1` gives a strictly sequential run. Output order does not depend on
    /// this value; records are always returned in page order.
    pub concurrency: usize,

    /// Per-request HTTP timeout in seconds for the page and every image.
    /// Default: 30.
    pub fetch_timeout_secs: u64,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// JPEG quality of stored thumbnails (1–100). Default: 90.
    pub jpeg_quality: u8,

    /// Optional observer for per-candidate events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            processed_dir: PathBuf::from(DEFAULT_PROCESSED_DIR),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            concurrency: 4,
            fetch_timeout_secs: 30,
            user_agent: concat!("webthumb/", env!("CARGO_PKG_VERSION")).to_string(),
            jpeg_quality: 90,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("processed_dir", &self.processed_dir)
            .field("public_prefix", &self.public_prefix)
            .field("concurrency", &self.concurrency)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("jpeg_quality", &self.jpeg_quality)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn processed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.processed_dir = dir.into();
        self
    }

    pub fn public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.public_prefix = prefix.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, WebThumbError> {
        let c = &self.config;
        if c.processed_dir.as_os_str().is_empty() {
            return Err(WebThumbError::InvalidConfig(
                "processed_dir must not be empty".into(),
            ));
        }
        if c.fetch_timeout_secs == 0 {
            return Err(WebThumbError::InvalidConfig(
                "fetch timeout must be ≥ 1 second".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(WebThumbError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Parameters of one run: which page, how big, what caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    page_url: Url,
    min_width: u32,
    min_height: u32,
    overlay_text: String,
}

impl RunRequest {
    /// Validate and build a request.
    ///
    /// # Errors
    /// [`WebThumbError::InvalidInput`] when the URL is empty, is not an
    /// absolute `http`/`https` URL with a host, or when either minimum is 0.
    pub fn new(
        page_url: &str,
        min_width: u32,
        min_height: u32,
        overlay_text: impl Into<String>,
    ) -> Result<Self, WebThumbError> {
        let trimmed = page_url.trim();
        if trimmed.is_empty() {
            return Err(WebThumbError::invalid_input(page_url, "page URL is empty"));
        }
        let url = Url::parse(trimmed)
            .map_err(|e| WebThumbError::invalid_input(page_url, format!("not a URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(WebThumbError::invalid_input(
                page_url,
                "only http and https pages are supported",
            ));
        }
        if url.host_str().is_none() {
            return Err(WebThumbError::invalid_input(page_url, "URL has no host"));
        }
        if min_width == 0 || min_height == 0 {
            return Err(WebThumbError::invalid_input(
                format!("{min_width}x{min_height}"),
                "minimum width and height must be positive",
            ));
        }

        Ok(Self {
            page_url: url,
            min_width,
            min_height,
            overlay_text: overlay_text.into(),
        })
    }

    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    pub fn min_width(&self) -> u32 {
        self.min_width
    }

    pub fn min_height(&self) -> u32 {
        self.min_height
    }

    pub fn overlay_text(&self) -> &str {
        &self.overlay_text
    }
}
