//! Grounding-context composition.

/// Separator between the document text and the table block, and between
/// individual tables.
pub const SECTION_SEPARATOR: &str = "\n\n";

/// Merge document text and normalised tables into one grounding context:
/// `text + "\n\n" + tables.join("\n\n")`.
///
/// When the text and every table are empty the context is empty, rather than
/// a bare separator.
pub fn compose_context<S: AsRef<str>>(document_text: &str, table_texts: &[S]) -> String {
    if document_text.is_empty() && table_texts.iter().all(|t| t.as_ref().is_empty()) {
        return String::new();
    }

    let tables = table_texts
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<&str>>()
        .join(SECTION_SEPARATOR);

    format!("{document_text}{SECTION_SEPARATOR}{tables}")
}
