//! Table normalisation: turn HTML table artefacts into compact text.
//!
//! Every qualifying markup artefact is reduced to one line per row, with
//! cells joined by [`CELL_DELIMITER`].
//!
//! ## Known simplification
//!
//! All `<tr>` elements of an artefact are flattened into one sequence of
//! lines, even when the artefact holds several tables. Row order is document
//! order.

use crate::error::ExtractionWarning;
use crate::output::{ArtifactKind, NormalizedTable, OutputArtifact};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

/// Delimiter between cells of one row.
pub const CELL_DELIMITER: &str = " | ";

static RE_TABLE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<table").unwrap());

static SEL_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static SEL_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static SEL_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());

/// Normalised tables plus the artefacts that had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct TableExtraction {
    pub tables: Vec<NormalizedTable>,
    pub warnings: Vec<ExtractionWarning>,
}

/// True if the markup contains a table-opening tag (case-insensitive).
pub fn is_table_markup(markup: &str) -> bool {
    RE_TABLE_OPEN.is_match(markup)
}

/// One normalised string per qualifying markup artefact, in scan order.
pub fn normalize_tables(artifacts: &[OutputArtifact]) -> Vec<String> {
    extract_tables(artifacts)
        .tables
        .into_iter()
        .map(|t| t.text)
        .collect()
}

/// Normalise every qualifying markup artefact, keeping source and markup.
///
/// Every qualifying artefact yields exactly one entry, in scan order. An
/// artefact with no table rows yields an empty string entry. When the
/// `<table` match does not come from a real table element (a comment, a
/// script string) the entry is still kept and an
/// [`ExtractionWarning::TableParse`] is recorded beside it.
pub fn extract_tables(artifacts: &[OutputArtifact]) -> TableExtraction {
    let mut out = TableExtraction::default();

    for artifact in artifacts.iter().filter(|a| a.kind == ArtifactKind::Markup) {
        let Some(markup) = artifact.text() else {
            continue;
        };
        if !is_table_markup(markup) {
            continue;
        }

        let source = artifact.display_path();
        let document = Html::parse_document(markup);
        if document.select(&SEL_TABLE).next().is_none() {
            warn!("{}: mentions <table> but no table element parsed", source);
            out.warnings.push(ExtractionWarning::TableParse {
                path: source.clone(),
                detail: "no <table> element found after parsing".into(),
            });
        }

        let text = rows_to_text(&document);
        debug!("{}: {} table rows", source, text.lines().count());
        out.tables.push(NormalizedTable {
            source,
            text,
            markup: markup.to_string(),
        });
    }

    out
}

/// Render every row of the markup as a delimiter-joined line.
///
/// Markup without rows renders as an empty string.
pub fn table_markup_to_text(markup: &str) -> String {
    rows_to_text(&Html::parse_document(markup))
}

fn rows_to_text(document: &Html) -> String {
    document
        .select(&SEL_ROW)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&SEL_CELL).map(cell_text).collect();
            if cells.iter().all(String::is_empty) {
                None
            } else {
                Some(cells.join(CELL_DELIMITER))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text content of a cell, trimmed, with whitespace runs collapsed.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
