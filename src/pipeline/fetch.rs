//! HTTP retrieval of pages and images.
//!
//! A single [`HttpFetcher`] (one pooled `reqwest::Client`) serves the page
//! and every image of a run. There are no retries here: a failed image is
//! reported once and the orchestrator moves on.
//!
//! The [`ImageFetcher`] trait is the seam tests plug an in-memory source
//! into, so the rest of the pipeline runs without network access.

use crate::error::FetchError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Anything that can turn a URL into raw bytes.
pub trait ImageFetcher: Send + Sync {
    /// Retrieve the full body of `url`.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// `reqwest`-backed fetcher with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Build the shared client.
    ///
    /// # Errors
    /// [`FetchError::Transport`] if the TLS backend cannot be initialised.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn map_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_error(url, e))?;

        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.into())
    }
}
