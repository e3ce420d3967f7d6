//! System prompts for grounded question answering.
//!
//! The grounding instruction lives here so that it can be inspected by unit
//! tests and replaced through
//! [`crate::config::PipelineConfig::system_prompt`] without touching the
//! transport code in [`crate::pipeline::chat`].

/// Placeholder replaced with the grounding context.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Default grounding instruction.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an assistant that answers questions strictly based on the following document content:\n\n{context}";

/// Render the system message for one question.
///
/// `template` defaults to [`DEFAULT_SYSTEM_PROMPT`]. Only the first
/// placeholder is replaced so that document text containing a literal
/// `{context}` is left untouched.
pub fn grounded_system_message(template: Option<&str>, context: &str) -> String {
    let template = template.unwrap_or(DEFAULT_SYSTEM_PROMPT);
    template.replacen(CONTEXT_PLACEHOLDER, context, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_embeds_context() {
        let msg = grounded_system_message(None, "Invoice #123\n\nTotal | 500");
        assert!(msg.starts_with("You are an assistant that answers questions strictly"));
        assert!(msg.ends_with("document content:\n\nInvoice #123\n\nTotal | 500"));
    }

    #[test]
    fn empty_context_is_allowed() {
        let msg = grounded_system_message(None, "");
        assert!(msg.ends_with("document content:\n\n"));
    }

    #[test]
    fn custom_template() {
        let msg = grounded_system_message(Some("Doc:\n{context}\nEnd."), "abc");
        assert_eq!(msg, "Doc:\nabc\nEnd.");
    }

    #[test]
    fn placeholder_inside_context_survives() {
        let msg = grounded_system_message(Some("<{context}>"), "x {context} y");
        assert_eq!(msg, "<x {context} y>");
    }
}
