//! Data model shared by the pipeline stages and returned to callers.

use crate::error::ExtractionWarning;
use crate::pipeline::context::compose_context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Classification of one file found in the OCR output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// `.md` / `.txt`
    Text,
    /// `.html` / `.htm`, possibly containing tables
    Markup,
    /// `.webp` / `.png` / `.jpg` / `.jpeg`
    Image,
}

impl ArtifactKind {
    /// Classify a path by its extension (case-insensitive).
    ///
    /// Returns `None` for anything the pipeline does not consume.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "txt" => Some(ArtifactKind::Text),
            "html" | "htm" => Some(ArtifactKind::Markup),
            "webp" | "png" | "jpg" | "jpeg" => Some(ArtifactKind::Image),
            _ => None,
        }
    }
}

/// Decoded payload of an artefact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactContent {
    /// Text and markup artefacts, decoded lossily as UTF-8.
    Text(String),
    /// Image artefacts, kept as raw bytes.
    Bytes(Vec<u8>),
}

/// One recognised file produced by the OCR tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    /// Path relative to the OCR output directory.
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub content: ArtifactContent,
}

impl OutputArtifact {
    /// Decoded text, for text and markup artefacts.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            ArtifactContent::Text(s) => Some(s),
            ArtifactContent::Bytes(_) => None,
        }
    }

    /// Raw bytes, for image artefacts.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.content {
            ArtifactContent::Bytes(b) => Some(b),
            ArtifactContent::Text(_) => None,
        }
    }

    /// Bare file name (no directories).
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Relative path rendered with `/` separators, for logs and warnings.
    pub fn display_path(&self) -> String {
        self.path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Textual rendering of the table rows found in one markup artefact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTable {
    /// Relative path of the source artefact.
    pub source: String,
    /// One line per non-empty row, cells joined with ` | `.
    pub text: String,
    /// The artefact's raw markup, for hosts that want to render it.
    pub markup: String,
}

/// An image artefact, carried for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// File name without directories.
    pub name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Counters and timings for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub text_artifacts: usize,
    pub markup_artifacts: usize,
    pub image_artifacts: usize,
    /// Regular files with an unrecognised extension.
    pub ignored_files: usize,
    /// Markup artefacts that qualified as tables and were normalised.
    pub tables: usize,
    pub ocr_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything the pipeline extracted from one OCR run.
///
/// Ordering of `tables` and `images` follows the scanner's lexicographic
/// path order, so identical OCR output always yields identical documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Original filename of the input.
    pub source_name: String,
    /// All text artefacts, separated by a blank line.
    pub text: String,
    pub tables: Vec<NormalizedTable>,
    pub images: Vec<ImageRecord>,
    pub warnings: Vec<ExtractionWarning>,
    pub stats: ExtractionStats,
}

impl ExtractedDocument {
    /// Normalised table strings, in extraction order.
    pub fn table_texts(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.text.as_str()).collect()
    }

    /// The context string grounding every question about this document.
    pub fn grounding_context(&self) -> String {
        compose_context(&self.text, &self.table_texts())
    }

    /// True when there is any text or table content to ground on.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || self.tables.iter().any(|t| !t.text.is_empty())
    }
}

/// One question and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub question: String,
    /// Grounding context the question was asked against.
    pub context: String,
    /// The endpoint's answer, verbatim. `None` on failure.
    pub answer: Option<String>,
    /// Human-readable failure description. `None` on success.
    pub error: Option<String>,
    pub model: String,
    pub duration_ms: u64,
}

impl ChatExchange {
    pub fn is_success(&self) -> bool {
        self.answer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_extensions() {
        assert_eq!(ArtifactKind::from_path(Path::new("a/page.md")), Some(ArtifactKind::Text));
        assert_eq!(ArtifactKind::from_path(Path::new("NOTES.TXT")), Some(ArtifactKind::Text));
        assert_eq!(ArtifactKind::from_path(Path::new("t.HtM")), Some(ArtifactKind::Markup));
        assert_eq!(ArtifactKind::from_path(Path::new("x/sig.JPEG")), Some(ArtifactKind::Image));
        assert_eq!(ArtifactKind::from_path(Path::new("fig.webp")), Some(ArtifactKind::Image));
        assert_eq!(ArtifactKind::from_path(Path::new("meta.json")), None);
        assert_eq!(ArtifactKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn artifact_names() {
        let a = OutputArtifact {
            path: PathBuf::from("page_1").join("img").join("sig.png"),
            kind: ArtifactKind::Image,
            content: ArtifactContent::Bytes(vec![1, 2, 3]),
        };
        assert_eq!(a.file_name(), "sig.png");
        assert_eq!(a.display_path(), "page_1/img/sig.png");
        assert_eq!(a.bytes(), Some(&[1u8, 2, 3][..]));
        assert_eq!(a.text(), None);
    }

    #[test]
    fn has_content() {
        let mut doc = ExtractedDocument::default();
        assert!(!doc.has_content());
        doc.tables.push(NormalizedTable {
            source: "t.html".into(),
            text: String::new(),
            markup: "<table></table>".into(),
        });
        assert!(!doc.has_content());
        doc.text = "Invoice #123".into();
        assert!(doc.has_content());
    }

    #[test]
    fn grounding_context_joins_text_and_tables() {
        let doc = ExtractedDocument {
            text: "Invoice #123".into(),
            tables: vec![NormalizedTable {
                source: "table.html".into(),
                text: "Total | 500".into(),
                markup: String::new(),
            }],
            ..Default::default()
        };
        assert_eq!(doc.grounding_context(), "Invoice #123\n\nTotal | 500");
    }

    #[test]
    fn image_bytes_not_serialised() {
        let img = ImageRecord {
            name: "sig.png".into(),
            bytes: vec![0; 16],
        };
        let json = serde_json::to_string(&img).unwrap();
        assert_eq!(json, r#"{"name":"sig.png"}"#);
    }
}
