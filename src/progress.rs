//! Progress-callback trait for per-candidate run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the images found on a page.
//!
//! # Example
//!
//! ```rust
//! use webthumb::{PipelineConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     stored: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_candidate_complete(&self, index: usize, total: usize, filename: &str) {
//!         self.stored.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} → {}", index + 1, total, filename);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { stored: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each candidate image.
///
/// Candidates are processed concurrently, so `on_candidate_*` may be called
/// from several tasks at once. Implementations must protect shared mutable
/// state (e.g. `Mutex`, `AtomicUsize`). All methods default to no-ops.
pub trait RunProgressCallback: Send + Sync {
    /// Called once the page has been parsed.
    ///
    /// # Arguments
    /// * `total_candidates` — resolved `<img>` sources that will be attempted
    fn on_run_start(&self, total_candidates: usize) {
        let _ = total_candidates;
    }

    /// Called before a candidate is fetched.
    ///
    /// # Arguments
    /// * `index` — 0-based extraction position
    /// * `total` — total candidates
    fn on_candidate_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a thumbnail has been stored.
    fn on_candidate_complete(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called when a candidate is dropped.
    ///
    /// # Arguments
    /// * `reason` — human-readable skip reason
    fn on_candidate_skipped(&self, index: usize, total: usize, reason: &str) {
        let _ = (index, total, reason);
    }

    /// Called once every candidate has been attempted.
    fn on_run_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        skips: AtomicUsize,
        total: AtomicUsize,
        succeeded: AtomicUsize,
    }

    impl RunProgressCallback for TrackingCallback {
        fn on_run_start(&self, total_candidates: usize) {
            self.total.store(total_candidates, Ordering::SeqCst);
        }

        fn on_candidate_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_candidate_complete(&self, _index: usize, _total: usize, _filename: &str) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_candidate_skipped(&self, _index: usize, _total: usize, _reason: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, _total: usize, success_count: usize) {
            self.succeeded.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(3);
        cb.on_candidate_start(0, 3);
        cb.on_candidate_complete(0, 3, "processed_abc.jpg");
        cb.on_candidate_skipped(1, 3, "too small");
        cb.on_run_complete(3, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_run_start(3);
        tracker.on_candidate_start(0, 3);
        tracker.on_candidate_complete(0, 3, "processed_a.jpg");
        tracker.on_candidate_start(1, 3);
        tracker.on_candidate_skipped(1, 3, "HTTP 404");
        tracker.on_candidate_start(2, 3);
        tracker.on_candidate_complete(2, 3, "processed_b.jpg");
        tracker.on_run_complete(3, 2);

        assert_eq!(tracker.total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 2);
    }
}
