//! # edgequake-docqa
//!
//! Ask questions about scanned documents. An external OCR tool reads the
//! document; this crate turns its output into one grounding context and asks
//! an LLM chat endpoint to answer strictly from it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / image
//!  │
//!  ├─ 1. Input    validate extension, materialise in a scoped TempDir
//!  ├─ 2. OCR      `<tool> <input> <out_dir> --method hf` (subprocess)
//!  ├─ 3. Scan     walk out_dir, classify .md/.txt · .html/.htm · images
//!  ├─ 4. Extract  text aggregation · table normalisation · image collection
//!  └─ 5. Ask      text + tables → system prompt → chat endpoint → answer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docqa::{OcrInput, PipelineConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .chat_url("http://localhost:11434/api/chat")
//!         .model("llama3.1:8b")
//!         .build()?;
//!     let mut session = Session::new(config)?;
//!
//!     let input = OcrInput::from_path("invoice.pdf").await?;
//!     let doc = session.ingest(&input).await?;
//!     eprintln!("{} tables, {} images", doc.tables.len(), doc.images.len());
//!
//!     println!("{}", session.ask("What is the total?").await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docqa` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{DocQaError, ExtractionWarning};
pub use extract::{ask, ask_sync, extract, extract_path, extract_sync};
pub use output::{
    ArtifactContent, ArtifactKind, ChatExchange, ExtractedDocument, ExtractionStats, ImageRecord,
    NormalizedTable, OutputArtifact,
};
pub use pipeline::chat::GroundedChatClient;
pub use pipeline::context::compose_context;
pub use pipeline::images::collect_images;
pub use pipeline::input::{MediaKind, OcrInput, OcrWorkspace};
pub use pipeline::ocr::{run_ocr, OcrOutcome};
pub use pipeline::scan::{scan, scan_artifacts, ScanResult};
pub use pipeline::tables::normalize_tables;
pub use pipeline::text::aggregate_text;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::Session;
