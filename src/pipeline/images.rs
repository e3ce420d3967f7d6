//! Image collection for display. Images never enter the grounding context.

use crate::output::{ArtifactKind, ImageRecord, OutputArtifact};

/// Image artefacts as `{name, bytes}` records, in scan order.
pub fn collect_images(artifacts: &[OutputArtifact]) -> Vec<ImageRecord> {
    artifacts
        .iter()
        .filter(|a| a.kind == ArtifactKind::Image)
        .filter_map(|a| {
            a.bytes().map(|b| ImageRecord {
                name: a.file_name(),
                bytes: b.to_vec(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ArtifactContent;
    use std::path::PathBuf;

    #[test]
    fn collects_names_and_bytes_in_order() {
        let arts = vec![
            OutputArtifact {
                path: PathBuf::from("p1/a.png"),
                kind: ArtifactKind::Image,
                content: ArtifactContent::Bytes(vec![1]),
            },
            OutputArtifact {
                path: PathBuf::from("p1/page.md"),
                kind: ArtifactKind::Text,
                content: ArtifactContent::Text("x".into()),
            },
            OutputArtifact {
                path: PathBuf::from("p2/b.webp"),
                kind: ArtifactKind::Image,
                content: ArtifactContent::Bytes(vec![2, 3]),
            },
        ];
        let images = collect_images(&arts);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].name, "a.png");
        assert_eq!(images[0].bytes, vec![1]);
        assert_eq!(images[1].name, "b.webp");
        assert_eq!(images[1].bytes, vec![2, 3]);
    }

    #[test]
    fn no_images() {
        assert!(collect_images(&[]).is_empty());
    }
}
