//! Error types for the edgequake-docqa library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocQaError`] — **Fatal**: the operation cannot produce a result at all
//!   (OCR tool missing or failing, chat endpoint unreachable, bad config).
//!   Returned as `Err(DocQaError)` from every public fallible function.
//!
//! * [`ExtractionWarning`] — **Non-fatal**: one artefact was imperfect (bytes
//!   that are not UTF-8, a markup file that mentions a table but contains
//!   none) while the rest of the OCR output is fine. Stored in
//!   [`crate::output::ExtractedDocument::warnings`] so callers can inspect
//!   what was substituted or skipped.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-docqa library.
#[derive(Debug, Error)]
pub enum DocQaError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The uploaded file does not carry an accepted extension.
    #[error("Unsupported file type for '{filename}'\nAccepted: pdf, png, jpg, jpeg, webp.")]
    UnsupportedMediaType { filename: String },

    /// Could not read a local input file.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not materialise the uploaded bytes inside the OCR workspace.
    #[error("Failed to write input file '{path}': {source}")]
    InputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scoped OCR workspace could not be created or removed.
    #[error("OCR workspace error: {0}")]
    WorkspaceFailed(String),

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR executable was not found or could not be launched.
    #[error("OCR tool '{tool}' could not be started: {reason}\nCheck that it is installed and on PATH, or pass --ocr-tool.")]
    OcrToolUnavailable { tool: String, reason: String },

    /// The OCR tool ran but exited unsuccessfully.
    ///
    /// `detail` is the tool's diagnostic stream, kept verbatim.
    #[error("OCR tool failed ({})\n{detail}", exit_label(.code))]
    OcrToolError { code: Option<i32>, detail: String },

    /// An artefact in the OCR output tree could not be read.
    #[error("Failed to read OCR artefact '{path}': {source}")]
    ArtifactReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Chat errors ───────────────────────────────────────────────────────
    /// The question was empty; nothing was sent.
    #[error("Question must not be empty")]
    EmptyQuestion,

    /// A question was asked before any document was ingested.
    #[error("No document has been processed yet.\nRun OCR on a document before asking questions.")]
    NoDocument,

    /// Network failure, timeout, or non-2xx status from the chat endpoint.
    #[error("{}", transport_message(.endpoint, .status, .reason))]
    ChatTransportError {
        endpoint: String,
        status: Option<u16>,
        reason: String,
    },

    /// The endpoint answered 2xx but the body lacks `message.content`.
    #[error("Chat endpoint '{endpoint}' returned an unexpected response: {detail}")]
    ChatResponseFormatError { endpoint: String, detail: String },

    /// The configured LLM provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocQaError {
    /// True for failures of the chat layer.
    ///
    /// Format errors are reported to users the same way as transport errors.
    pub fn is_chat_failure(&self) -> bool {
        matches!(
            self,
            DocQaError::ChatTransportError { .. } | DocQaError::ChatResponseFormatError { .. }
        )
    }

    /// True for failures of the OCR layer.
    pub fn is_ocr_failure(&self) -> bool {
        matches!(
            self,
            DocQaError::OcrToolUnavailable { .. } | DocQaError::OcrToolError { .. }
        )
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_string(),
    }
}

fn transport_message(endpoint: &str, status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(s) => format!("Chat endpoint '{endpoint}' returned HTTP {s}: {reason}"),
        None => format!("Chat request to '{endpoint}' failed: {reason}"),
    }
}

/// A non-fatal anomaly found while reading the OCR output.
///
/// The extraction continues; the affected artefact is either decoded with
/// replacement characters or left out of the table list.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionWarning {
    /// Invalid UTF-8 sequences were replaced with U+FFFD.
    #[error("{path}: undecodable bytes replaced")]
    ArtifactDecode { path: String },

    /// A markup artefact mentioned a table but none could be parsed from it.
    #[error("{path}: table skipped: {detail}")]
    TableParse { path: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocr_tool_error_display_keeps_detail() {
        let e = DocQaError::OcrToolError {
            code: Some(2),
            detail: "bad input".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("exit code 2"), "got: {msg}");
        assert!(msg.ends_with("bad input"), "got: {msg}");
    }

    #[test]
    fn ocr_tool_error_display_signal() {
        let e = DocQaError::OcrToolError {
            code: None,
            detail: String::new(),
        };
        assert!(e.to_string().contains("signal"));
    }

    #[test]
    fn transport_error_display_with_status() {
        let e = DocQaError::ChatTransportError {
            endpoint: "http://localhost:11434/api/chat".into(),
            status: Some(500),
            reason: "model not loaded".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("HTTP 500"), "got: {msg}");
        assert!(msg.contains("model not loaded"));
    }

    #[test]
    fn transport_error_display_without_status() {
        let e = DocQaError::ChatTransportError {
            endpoint: "http://x".into(),
            status: None,
            reason: "connection refused".into(),
        };
        assert!(e.to_string().contains("connection refused"));
    }

    #[test]
    fn chat_failure_grouping() {
        let format = DocQaError::ChatResponseFormatError {
            endpoint: "http://x".into(),
            detail: "missing message.content".into(),
        };
        assert!(format.is_chat_failure());
        assert!(!format.is_ocr_failure());
        assert!(!DocQaError::EmptyQuestion.is_chat_failure());

        let unavailable = DocQaError::OcrToolUnavailable {
            tool: "chandra".into(),
            reason: "not found".into(),
        };
        assert!(unavailable.is_ocr_failure());
    }

    #[test]
    fn warning_display() {
        let w = ExtractionWarning::TableParse {
            path: "page_1/table.html".into(),
            detail: "no <table> element".into(),
        };
        assert!(w.to_string().starts_with("page_1/table.html"));
    }
}
