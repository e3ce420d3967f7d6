//! Pipeline stages for document ingestion and grounded chat.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the OCR tool or chat backend can change without touching the
//! stages around it.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ ocr ──▶ scan ──┬─▶ text ───┐
//! (TempDir) (proc)  (walk) ├─▶ tables ─┴─▶ context ──▶ chat
//!                          └─▶ images (display only)
//! ```
//!
//! 1. [`input`]   — validate the upload, materialise it in a scoped workspace
//! 2. [`ocr`]     — run the external OCR tool; the only subprocess stage
//! 3. [`scan`]    — walk and classify the output tree in a stable order
//! 4. [`text`]    — concatenate text artefacts
//! 5. [`tables`]  — reduce HTML tables to `A | B` lines
//! 6. [`images`]  — carry image bytes through for display
//! 7. [`context`] — merge text and tables into one grounding string
//! 8. [`chat`]    — ask the chat endpoint; the only network stage

pub mod chat;
pub mod context;
pub mod images;
pub mod input;
pub mod ocr;
pub mod scan;
pub mod tables;
pub mod text;
