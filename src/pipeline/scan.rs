//! Artefact scanning: walk the OCR output tree and classify every file.
//!
//! ## Why sort after walking?
//!
//! Directory enumeration order is file-system dependent. Every later stage
//! concatenates in scan order, so the scanner sorts by relative path
//! (component-wise, like `Path`'s `Ord`) to make two runs over identical
//! output produce byte-identical documents.

use crate::error::{DocQaError, ExtractionWarning};
use crate::output::{ArtifactContent, ArtifactKind, OutputArtifact};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Result of one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Recognised artefacts in lexicographic path order.
    pub artifacts: Vec<OutputArtifact>,
    /// Decode anomalies, in the same order.
    pub warnings: Vec<ExtractionWarning>,
    /// Regular files skipped because of their extension.
    pub ignored: usize,
}

/// Scan `output_dir` on the blocking thread pool.
pub async fn scan_artifacts(output_dir: &Path) -> Result<ScanResult, DocQaError> {
    let dir = output_dir.to_path_buf();
    tokio::task::spawn_blocking(move || scan(&dir))
        .await
        .map_err(|e| DocQaError::Internal(format!("Scan task panicked: {}", e)))?
}

/// Recursively list and read every recognised file under `output_dir`.
///
/// Symlinks are not followed. Files with other extensions are counted in
/// [`ScanResult::ignored`] and otherwise skipped.
pub fn scan(output_dir: &Path) -> Result<ScanResult, DocQaError> {
    let mut found: Vec<(PathBuf, ArtifactKind)> = Vec::new();
    let mut ignored = 0usize;

    for entry in WalkDir::new(output_dir).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| output_dir.to_path_buf());
            DocQaError::ArtifactReadFailed {
                path,
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(output_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| entry.path().to_path_buf());

        match ArtifactKind::from_path(&rel) {
            Some(kind) => found.push((rel, kind)),
            None => {
                debug!("Ignoring {}", rel.display());
                ignored += 1;
            }
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));

    let mut result = ScanResult {
        artifacts: Vec::with_capacity(found.len()),
        warnings: Vec::new(),
        ignored,
    };

    for (rel, kind) in found {
        let abs = output_dir.join(&rel);
        let bytes = std::fs::read(&abs).map_err(|e| DocQaError::ArtifactReadFailed {
            path: abs.clone(),
            source: e,
        })?;

        let content = match kind {
            ArtifactKind::Image => ArtifactContent::Bytes(bytes),
            ArtifactKind::Text | ArtifactKind::Markup => {
                let (text, lossy) = decode_lossy(bytes);
                if lossy {
                    let artifact_path = display(&rel);
                    warn!("{}: invalid UTF-8 replaced", artifact_path);
                    result.warnings.push(ExtractionWarning::ArtifactDecode {
                        path: artifact_path,
                    });
                }
                ArtifactContent::Text(text)
            }
        };

        result.artifacts.push(OutputArtifact {
            path: rel,
            kind,
            content,
        });
    }

    debug!(
        "Scanned {}: {} artefacts, {} ignored",
        output_dir.display(),
        result.artifacts.len(),
        result.ignored
    );

    Ok(result)
}

/// Decode as UTF-8, replacing invalid sequences. Returns whether any
/// replacement happened.
fn decode_lossy(bytes: Vec<u8>) -> (String, bool) {
    match String::from_utf8(bytes) {
        Ok(s) => (s, false),
        Err(e) => match String::from_utf8_lossy(e.as_bytes()) {
            Cow::Owned(s) => (s, true),
            Cow::Borrowed(s) => (s.to_string(), false),
        },
    }
}

fn display(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/nested")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("b/nested/deep.txt"), "deep").unwrap();
        fs::write(root.join("b/page.MD"), "page b").unwrap();
        fs::write(root.join("a/page.md"), "page a").unwrap();
        fs::write(root.join("a/table.html"), "<table></table>").unwrap();
        fs::write(root.join("a/fig.png"), [0x89, b'P', b'N', b'G']).unwrap();
        fs::write(root.join("meta.json"), "{}").unwrap();
        fs::write(root.join("z.txt"), "last").unwrap();
        dir
    }

    fn paths(result: &ScanResult) -> Vec<String> {
        result.artifacts.iter().map(|a| a.display_path()).collect()
    }

    #[test]
    fn sorted_and_classified() {
        let dir = tree();
        let result = scan(dir.path()).unwrap();
        assert_eq!(
            paths(&result),
            vec![
                "a/fig.png",
                "a/page.md",
                "a/table.html",
                "b/nested/deep.txt",
                "b/page.MD",
                "z.txt"
            ]
        );
        assert_eq!(result.ignored, 1);
        assert_eq!(result.artifacts[0].kind, ArtifactKind::Image);
        assert_eq!(result.artifacts[0].bytes(), Some(&[0x89, b'P', b'N', b'G'][..]));
        assert_eq!(result.artifacts[2].kind, ArtifactKind::Markup);
        assert_eq!(result.artifacts[4].text(), Some("page b"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn repeated_scans_are_identical() {
        let dir = tree();
        let first = scan(dir.path()).unwrap();
        let second = scan(dir.path()).unwrap();
        assert_eq!(first.artifacts, second.artifacts);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.txt"), [b'o', b'k', 0xff, 0xfe, b'!']).unwrap();
        let result = scan(dir.path()).unwrap();
        assert_eq!(result.artifacts.len(), 1);
        let text = result.artifacts[0].text().unwrap();
        assert!(text.starts_with("ok"));
        assert!(text.ends_with('!'));
        assert!(text.contains('\u{FFFD}'));
        assert_eq!(
            result.warnings,
            vec![ExtractionWarning::ArtifactDecode {
                path: "bad.txt".into()
            }]
        );
    }

    #[test]
    fn empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = scan(dir.path()).unwrap();
        assert!(result.artifacts.is_empty());
        assert_eq!(result.ignored, 0);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let err = scan(Path::new("/definitely/not/a/dir")).unwrap_err();
        assert!(matches!(err, DocQaError::ArtifactReadFailed { .. }));
    }

    #[tokio::test]
    async fn async_wrapper() {
        let dir = tree();
        let result = scan_artifacts(dir.path()).await.unwrap();
        assert_eq!(result.artifacts.len(), 6);
    }
}
