//! The processed-images catalog: a flat directory of `processed_<token>.jpg`.
//!
//! There is no index or sidecar file. Writing returns a full
//! [`ProcessedImageRecord`]; listing rebuilds lighter [`CatalogEntry`]
//! values from the directory itself, using file modification times.
//!
//! Files are written to a hidden `.processed_<token>.jpg.tmp` sibling and
//! renamed into place, so a concurrent listing never sees a half-written
//! thumbnail.

use crate::config::{PipelineConfig, DEFAULT_PROCESSED_DIR, DEFAULT_PUBLIC_PREFIX};
use crate::error::{PersistError, WebThumbError};
use crate::output::{CatalogEntry, ProcessedImageRecord};
use chrono::{DateTime, Local};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Extension of stored thumbnails; also the listing filter.
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// Prefix of generated filenames.
pub const FILENAME_PREFIX: &str = "processed_";

/// Where thumbnails persist and how their public paths are formed.
pub trait CatalogStore: Send + Sync {
    /// Persist one encoded thumbnail under a fresh unique name.
    fn store(
        &self,
        jpeg: &[u8],
        original_url: &str,
        overlay_text: &str,
    ) -> impl Future<Output = Result<ProcessedImageRecord, PersistError>> + Send;

    /// Every stored thumbnail, newest first.
    fn list(&self) -> impl Future<Output = Result<Vec<CatalogEntry>, WebThumbError>> + Send;
}

/// Location settings of a [`LocalCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub processed_dir: PathBuf,
    pub public_prefix: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            processed_dir: PathBuf::from(DEFAULT_PROCESSED_DIR),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
        }
    }
}

impl From<&PipelineConfig> for CatalogConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            processed_dir: config.processed_dir.clone(),
            public_prefix: config.public_prefix.clone(),
        }
    }
}

/// Catalog backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    config: CatalogConfig,
}

impl LocalCatalog {
    /// Create a catalog handle. No filesystem access happens here; call
    /// [`LocalCatalog::init`] before storing.
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    pub fn dir(&self) -> &Path {
        &self.config.processed_dir
    }

    /// Create the directory if it does not exist yet. Idempotent.
    pub async fn init(&self) -> Result<(), WebThumbError> {
        let dir = self.dir();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| WebThumbError::CatalogInit {
                path: dir.to_path_buf(),
                source: e,
            })?;
        debug!("Catalog directory ready: {}", dir.display());
        Ok(())
    }

    /// Public path for a stored filename.
    pub fn public_path(&self, filename: &str) -> String {
        format!(
            "{}/{}",
            self.config.public_prefix.trim_end_matches('/'),
            filename
        )
    }

    /// A fresh `processed_<uuid>.jpg` name.
    pub fn generate_filename() -> String {
        format!(
            "{}{}.{}",
            FILENAME_PREFIX,
            Uuid::new_v4().simple(),
            THUMBNAIL_EXTENSION
        )
    }

    async fn entry_for(&self, path: &Path) -> Option<CatalogEntry> {
        if path.extension().and_then(|e| e.to_str()) != Some(THUMBNAIL_EXTENSION) {
            return None;
        }
        let filename = path.file_name()?.to_str()?.to_string();

        // Follows symlinks; a dangling link simply drops out of the listing.
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                return None;
            }
        };
        if !metadata.is_file() {
            return None;
        }
        let modified = metadata.modified().ok()?;

        Some(CatalogEntry {
            path: self.public_path(&filename),
            filename,
            created_at: DateTime::<Local>::from(modified),
        })
    }
}

impl CatalogStore for LocalCatalog {
    async fn store(
        &self,
        jpeg: &[u8],
        original_url: &str,
        overlay_text: &str,
    ) -> Result<ProcessedImageRecord, PersistError> {
        let filename = Self::generate_filename();
        let final_path = self.dir().join(&filename);
        let tmp_path = self.dir().join(format!(".{filename}.tmp"));

        if let Err(e) = tokio::fs::write(&tmp_path, jpeg).await {
            // Nothing useful to do if the cleanup fails as well.
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(PersistError {
                path: final_path,
                source: e,
            });
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(PersistError {
                path: final_path,
                source: e,
            });
        }

        info!("Stored {} ({} bytes) from {}", filename, jpeg.len(), original_url);

        Ok(ProcessedImageRecord {
            path: self.public_path(&filename),
            filename,
            original_url: original_url.to_string(),
            overlay_text: overlay_text.to_string(),
            created_at: Local::now(),
        })
    }

    async fn list(&self) -> Result<Vec<CatalogEntry>, WebThumbError> {
        let dir = self.dir();
        let read_err = |e: std::io::Error| WebThumbError::CatalogRead {
            path: dir.to_path_buf(),
            source: e,
        };

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Catalog directory {} does not exist yet", dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(read_err(e)),
        };

        let mut listing = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            if let Some(catalog_entry) = self.entry_for(&entry.path()).await {
                listing.push(catalog_entry);
            }
        }

        listing.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.filename.cmp(&a.filename))
        });

        debug!("Listed {} thumbnails in {}", listing.len(), dir.display());
        Ok(listing)
    }
}
