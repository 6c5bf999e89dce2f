//! Progress-callback trait for submission events.
//!
//! Inject an [`Arc<dyn SubmissionProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to observe a
//! submission as it moves from upload to saved artifacts. The CLI uses it to
//! drive a spinner; a GUI would flip its submit button and error banner.
//!
//! # Example
//!
//! ```rust
//! use convertdesk::{ClientConfig, SubmissionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     saved: AtomicUsize,
//! }
//!
//! impl SubmissionProgressCallback for CountingCallback {
//!     fn on_artifact_saved(&self, name: &str, size: u64) {
//!         self.saved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("saved {name} ({size} bytes)");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { saved: AtomicUsize::new(0) });
//! let config = ClientConfig::builder()
//!     .progress_callback(cb as Arc<dyn SubmissionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by a [`crate::session::ToolSession`] as a submission progresses.
///
/// All methods default to no-ops so callers only override what they need.
pub trait SubmissionProgressCallback: Send + Sync {
    /// Called once the request is built, just before it is sent.
    ///
    /// # Arguments
    /// * `tool_id`: id of the tool being run
    /// * `file_count`: number of file parts in the upload
    fn on_submit_start(&self, tool_id: &str, file_count: usize) {
        let _ = (tool_id, file_count);
    }

    /// Called when a complete response has been received.
    fn on_response(&self, status: u16, content_type: Option<&str>) {
        let _ = (status, content_type);
    }

    /// Called after each artifact is written.
    fn on_artifact_saved(&self, name: &str, size: u64) {
        let _ = (name, size);
    }

    /// Called when the submission ends in any error.
    fn on_submit_error(&self, message: &str) {
        let _ = message;
    }

    /// Called when every artifact has been saved.
    fn on_submit_complete(&self, artifact_count: usize) {
        let _ = artifact_count;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SubmissionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn SubmissionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        saved: AtomicUsize,
        errors: AtomicUsize,
    }

    impl SubmissionProgressCallback for TrackingCallback {
        fn on_submit_start(&self, _tool_id: &str, _file_count: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_artifact_saved(&self, _name: &str, _size: u64) {
            self.saved.fetch_add(1, Ordering::SeqCst);
        }

        fn on_submit_error(&self, _message: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_submit_start("pdf-split", 1);
        cb.on_response(200, Some("application/zip"));
        cb.on_artifact_saved("split_a.zip", 10);
        cb.on_submit_error("boom");
        cb.on_submit_complete(1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_submit_start("pdf-to-jpg", 1);
        tracker.on_artifact_saved("p1.jpg", 3);
        tracker.on_artifact_saved("p2.jpg", 3);
        tracker.on_submit_error("later failure");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.saved.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn SubmissionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_submit_start("create-zip", 3);
        cb.on_submit_complete(1);
    }
}
