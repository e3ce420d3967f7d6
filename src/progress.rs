//! Progress-callback trait for the long-running pipeline stages.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events while a document is being processed. OCR on a multi-page scan can
//! take minutes, so hosts usually want to show something while it runs.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docqa::{ExtractionProgressCallback, PipelineConfig};
//! use std::sync::Arc;
//!
//! struct LogCallback;
//!
//! impl ExtractionProgressCallback for LogCallback {
//!     fn on_ocr_complete(&self, duration_ms: u64) {
//!         eprintln!("OCR finished in {duration_ms}ms");
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(LogCallback) as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ExtractionStats;
use std::sync::Arc;

/// Called by the extraction pipeline as it moves between stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called just before the OCR subprocess is spawned.
    ///
    /// # Arguments
    /// * `input_name` — original filename of the document
    fn on_ocr_start(&self, input_name: &str) {
        let _ = input_name;
    }

    /// Called when the OCR tool exited successfully.
    fn on_ocr_complete(&self, duration_ms: u64) {
        let _ = duration_ms;
    }

    /// Called when the OCR tool could not be started or failed.
    fn on_ocr_error(&self, error: &str) {
        let _ = error;
    }

    /// Called after the output tree was walked.
    ///
    /// # Arguments
    /// * `count` — number of recognised artefacts (text, markup, image)
    fn on_artifacts_scanned(&self, count: usize) {
        let _ = count;
    }

    /// Called once the [`crate::output::ExtractedDocument`] is assembled.
    fn on_extraction_complete(&self, stats: &ExtractionStats) {
        let _ = stats;
    }

    /// Called when extraction fails at any stage, after any stage-specific
    /// hook such as [`Self::on_ocr_error`]. No other event follows it.
    fn on_extraction_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        ocr_starts: AtomicUsize,
        ocr_errors: AtomicUsize,
        scanned: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_ocr_start(&self, _input_name: &str) {
            self.ocr_starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_ocr_error(&self, _error: &str) {
            self.ocr_errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_artifacts_scanned(&self, count: usize) {
            self.scanned.store(count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_ocr_start("scan.pdf");
        cb.on_ocr_complete(1200);
        cb.on_ocr_error("boom");
        cb.on_artifacts_scanned(3);
        cb.on_extraction_complete(&ExtractionStats::default());
        cb.on_extraction_error("scan failed");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_ocr_start("scan.pdf");
        tracker.on_ocr_error("exit code 2");
        tracker.on_artifacts_scanned(7);
        // Not overridden: falls through to the default.
        tracker.on_ocr_complete(10);

        assert_eq!(tracker.ocr_starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.ocr_errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.scanned.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_ocr_start("a.png");
        cb.on_artifacts_scanned(0);
    }
}
