//! Upload boundary and the scoped OCR workspace.
//!
//! The OCR tool needs a file-system path for its input and a directory to
//! write into. [`OcrWorkspace`] owns a `TempDir` holding both, so everything
//! the run produced is removed when the workspace is dropped, whether the
//! run succeeded, the tool failed, or reading the artefacts failed.

use crate::error::DocQaError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Accepted input document types, validated by extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Pdf,
    Png,
    Jpeg,
    Webp,
}

impl MediaKind {
    /// Derive the media kind from a filename's extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self, DocQaError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => Ok(MediaKind::Pdf),
            Some("png") => Ok(MediaKind::Png),
            Some("jpg") | Some("jpeg") => Ok(MediaKind::Jpeg),
            Some("webp") => Ok(MediaKind::Webp),
            _ => Err(DocQaError::UnsupportedMediaType {
                filename: filename.to_string(),
            }),
        }
    }

    /// Declared MIME type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaKind::Pdf => "application/pdf",
            MediaKind::Png => "image/png",
            MediaKind::Jpeg => "image/jpeg",
            MediaKind::Webp => "image/webp",
        }
    }
}

/// A document submitted for OCR: its bytes and original filename.
#[derive(Debug, Clone)]
pub struct OcrInput {
    filename: String,
    media: MediaKind,
    bytes: Vec<u8>,
}

impl OcrInput {
    /// Wrap uploaded bytes. Fails if the filename's extension is not accepted.
    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DocQaError> {
        let filename = filename.into();
        let media = MediaKind::from_filename(&filename)?;
        Ok(Self {
            filename,
            media,
            bytes,
        })
    }

    /// Read a local file into an `OcrInput`.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, DocQaError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        // Validate before reading so an unsupported file is rejected cheaply.
        MediaKind::from_filename(&filename)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DocQaError::InputReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_bytes(filename, bytes)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn media(&self) -> MediaKind {
        self.media
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Name of the materialised input: `input.<ext>`, keeping the original
    /// extension lower-cased so the OCR tool can sniff the type.
    fn materialised_name(&self) -> String {
        let ext = Path::new(&self.filename)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        format!("input.{ext}")
    }
}

/// Directory holding the materialised input and the OCR output for one run.
///
/// Dropping the workspace removes it and all contents.
#[derive(Debug)]
pub struct OcrWorkspace {
    input_path: PathBuf,
    output_dir: PathBuf,
    temp_dir: TempDir,
}

impl OcrWorkspace {
    /// Create a fresh workspace: write `input` to disk and create an empty
    /// `ocr_output/` directory beside it.
    pub async fn create(input: &OcrInput) -> Result<Self, DocQaError> {
        let temp_dir = tempfile::Builder::new()
            .prefix("docqa-")
            .tempdir()
            .map_err(|e| DocQaError::WorkspaceFailed(format!("cannot create temp dir: {e}")))?;

        let input_path = temp_dir.path().join(input.materialised_name());
        let output_dir = temp_dir.path().join("ocr_output");

        tokio::fs::write(&input_path, input.bytes())
            .await
            .map_err(|e| DocQaError::InputWriteFailed {
                path: input_path.clone(),
                source: e,
            })?;
        tokio::fs::create_dir(&output_dir)
            .await
            .map_err(|e| DocQaError::WorkspaceFailed(format!("cannot create output dir: {e}")))?;

        debug!(
            "Workspace {} ready ({} bytes of {})",
            temp_dir.path().display(),
            input.bytes().len(),
            input.media().mime_type()
        );

        Ok(Self {
            input_path,
            output_dir,
            temp_dir,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Remove the workspace now, reporting removal failures.
    ///
    /// Dropping the workspace also removes it but swallows errors.
    pub fn close(self) -> Result<(), DocQaError> {
        let root = self.temp_dir.path().to_path_buf();
        self.temp_dir.close().map_err(|e| {
            DocQaError::WorkspaceFailed(format!("cannot remove {}: {e}", root.display()))
        })
    }
}
