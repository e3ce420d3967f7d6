//! Text aggregation: concatenate every text artefact into one document.

use crate::output::{ArtifactKind, OutputArtifact};

/// Separator placed between consecutive text artefacts.
pub const ARTIFACT_SEPARATOR: &str = "\n\n";

/// Join the decoded contents of all text artefacts, in scan order, with a
/// blank line between them. No text artefacts yields an empty string.
pub fn aggregate_text(artifacts: &[OutputArtifact]) -> String {
    artifacts
        .iter()
        .filter(|a| a.kind == ArtifactKind::Text)
        .filter_map(OutputArtifact::text)
        .collect::<Vec<_>>()
        .join(ARTIFACT_SEPARATOR)
}
