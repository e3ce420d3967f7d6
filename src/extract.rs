//! Document ingestion and grounded-question entry points.
//!
//! [`extract`] runs one document through the whole ingestion pipeline and
//! returns an [`ExtractedDocument`]; [`ask`] answers a question against it.
//! Both are async; [`extract_sync`] and [`ask_sync`] wrap them for callers
//! without a runtime.

use crate::config::PipelineConfig;
use crate::error::DocQaError;
use crate::output::{ArtifactKind, ExtractedDocument, ExtractionStats};
use crate::pipeline::chat::GroundedChatClient;
use crate::pipeline::input::{OcrInput, OcrWorkspace};
use crate::pipeline::{images, ocr, scan, tables, text};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Run OCR on `input` and assemble the extracted document.
///
/// # Resource scoping
/// The workspace (materialised input + OCR output tree) is created right
/// before the OCR tool starts and removed before this function returns, on
/// every path: success, tool failure, or artefact read failure.
///
/// # Errors
/// - [`DocQaError::OcrToolUnavailable`] / [`DocQaError::OcrToolError`] — no
///   partial result is produced and nothing is scanned
/// - [`DocQaError::ArtifactReadFailed`] — an artefact could not be read
///
/// Undecodable bytes and unparseable tables are not errors; they are
/// reported in [`ExtractedDocument::warnings`].
pub async fn extract(
    input: &OcrInput,
    config: &PipelineConfig,
) -> Result<ExtractedDocument, DocQaError> {
    let total_start = Instant::now();
    info!("Starting extraction: {}", input.filename());

    let result = extract_scoped(input, config, total_start).await;

    if let (Err(e), Some(cb)) = (&result, config.progress_callback.as_ref()) {
        cb.on_extraction_error(&e.to_string());
    }
    result
}

async fn extract_scoped(
    input: &OcrInput,
    config: &PipelineConfig,
    total_start: Instant,
) -> Result<ExtractedDocument, DocQaError> {
    // ── Step 1: Scoped workspace ─────────────────────────────────────────
    let workspace = OcrWorkspace::create(input).await?;

    let result = extract_in(&workspace, input, config, total_start).await;

    // ── Cleanup: remove the workspace on every path ─────────────────────
    if let Err(e) = workspace.close() {
        warn!("{}", e);
    }

    result
}

async fn extract_in(
    workspace: &OcrWorkspace,
    input: &OcrInput,
    config: &PipelineConfig,
    total_start: Instant,
) -> Result<ExtractedDocument, DocQaError> {
    let cb = config.progress_callback.as_ref();

    // ── Step 2: OCR ──────────────────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_ocr_start(input.filename());
    }
    let outcome = match ocr::run_ocr(workspace.input_path(), workspace.output_dir(), config).await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(cb) = cb {
                cb.on_ocr_error(&e.to_string());
            }
            return Err(e);
        }
    };
    if let Some(cb) = cb {
        cb.on_ocr_complete(outcome.duration_ms);
    }

    // ── Step 3: Scan ─────────────────────────────────────────────────────
    let scanned = scan::scan_artifacts(workspace.output_dir()).await?;
    if let Some(cb) = cb {
        cb.on_artifacts_scanned(scanned.artifacts.len());
    }
    let artifacts = &scanned.artifacts;

    // ── Step 4: Aggregate / normalise / collect ──────────────────────────
    let document_text = text::aggregate_text(artifacts);
    let table_out = tables::extract_tables(artifacts);
    let image_records = images::collect_images(artifacts);

    // ── Step 5: Assemble ─────────────────────────────────────────────────
    let count = |kind: ArtifactKind| artifacts.iter().filter(|a| a.kind == kind).count();
    let stats = ExtractionStats {
        text_artifacts: count(ArtifactKind::Text),
        markup_artifacts: count(ArtifactKind::Markup),
        image_artifacts: count(ArtifactKind::Image),
        ignored_files: scanned.ignored,
        tables: table_out.tables.len(),
        ocr_duration_ms: outcome.duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    let mut warnings = scanned.warnings;
    warnings.extend(table_out.warnings);

    info!(
        "Extraction complete: {} text / {} tables / {} images, {} warnings, {}ms total",
        stats.text_artifacts,
        stats.tables,
        stats.image_artifacts,
        warnings.len(),
        stats.total_duration_ms
    );

    if let Some(cb) = cb {
        cb.on_extraction_complete(&stats);
    }

    Ok(ExtractedDocument {
        source_name: input.filename().to_string(),
        text: document_text,
        tables: table_out.tables,
        images: image_records,
        warnings,
        stats,
    })
}

/// Read a local file and run [`extract`] on it.
pub async fn extract_path(
    path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ExtractedDocument, DocQaError> {
    let input = OcrInput::from_path(path).await?;
    extract(&input, config).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input: &OcrInput,
    config: &PipelineConfig,
) -> Result<ExtractedDocument, DocQaError> {
    runtime()?.block_on(extract(input, config))
}

/// Answer `question` grounded on `document`.
///
/// Builds a client from `config` for this one call; hold a
/// [`GroundedChatClient`] (or a [`crate::session::Session`]) to reuse the
/// HTTP connection pool across questions.
pub async fn ask(
    document: &ExtractedDocument,
    question: &str,
    config: &PipelineConfig,
) -> Result<String, DocQaError> {
    let client = GroundedChatClient::from_config(config)?;
    client.ask(&document.grounding_context(), question).await
}

/// Synchronous wrapper around [`ask`].
pub fn ask_sync(
    document: &ExtractedDocument,
    question: &str,
    config: &PipelineConfig,
) -> Result<String, DocQaError> {
    runtime()?.block_on(ask(document, question, config))
}

fn runtime() -> Result<tokio::runtime::Runtime, DocQaError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocQaError::Internal(format!("Failed to create tokio runtime: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::progress::ExtractionProgressCallback;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Failures {
        ocr: AtomicUsize,
        extraction: AtomicUsize,
        completed: AtomicUsize,
    }

    impl ExtractionProgressCallback for Failures {
        fn on_ocr_error(&self, _error: &str) {
            self.ocr.fetch_add(1, Ordering::SeqCst);
        }

        fn on_extraction_error(&self, _error: &str) {
            self.extraction.fetch_add(1, Ordering::SeqCst);
        }

        fn on_extraction_complete(&self, _stats: &ExtractionStats) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn missing_tool_is_fatal_and_reported() {
        let failures = Arc::new(Failures::default());
        let config = PipelineConfig::builder()
            .ocr_tool("/definitely/not/an/ocr-tool")
            .progress_callback(failures.clone())
            .build()
            .unwrap();
        let input = OcrInput::from_bytes("scan.pdf", b"%PDF".to_vec()).unwrap();

        let err = extract(&input, &config).await.unwrap_err();
        assert!(matches!(err, DocQaError::OcrToolUnavailable { .. }));
        assert_eq!(failures.ocr.load(Ordering::SeqCst), 1);
        assert_eq!(failures.extraction.load(Ordering::SeqCst), 1);
        assert_eq!(failures.completed.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn scan_failure_after_ocr_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        // The tool succeeds but removes its own output directory.
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("vanishing-ocr");
        std::fs::write(&tool, "#!/bin/sh\nrm -rf \"$2\"\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let failures = Arc::new(Failures::default());
        let config = PipelineConfig::builder()
            .ocr_tool(tool.to_string_lossy())
            .progress_callback(failures.clone())
            .build()
            .unwrap();
        let input = OcrInput::from_bytes("scan.png", vec![0]).unwrap();

        let err = extract(&input, &config).await.unwrap_err();
        assert!(matches!(err, DocQaError::ArtifactReadFailed { .. }));
        assert_eq!(failures.ocr.load(Ordering::SeqCst), 0);
        assert_eq!(failures.extraction.load(Ordering::SeqCst), 1);
        assert_eq!(failures.completed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sync_wrapper_propagates_errors() {
        let config = PipelineConfig::builder()
            .ocr_tool("/definitely/not/an/ocr-tool")
            .build()
            .unwrap();
        let input = OcrInput::from_bytes("scan.png", vec![0]).unwrap();
        assert!(extract_sync(&input, &config).unwrap_err().is_ocr_failure());
    }

    #[test]
    fn ask_sync_rejects_empty_question() {
        let doc = ExtractedDocument::default();
        let err = ask_sync(&doc, "", &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, DocQaError::EmptyQuestion));
    }
}
