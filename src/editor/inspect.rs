use super::structure::{Document, Paragraph, RunStyle};

/// One line per paragraph: plain runs quoted, tagged runs in brackets,
/// placeholders as `<br>`. The empty state prints as `<empty>`.
pub fn dump_document(document: &Document) -> String {
    if document.is_empty_state() {
        return "<empty>".to_string();
    }
    document
        .paragraphs
        .iter()
        .map(dump_paragraph)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn dump_paragraph(paragraph: &Paragraph) -> String {
    if paragraph.is_placeholder() {
        return "<br>".to_string();
    }
    paragraph
        .runs
        .iter()
        .map(|run| match run.style {
            RunStyle::Plain => format!("{:?}", run.text),
            RunStyle::Tagged(_) => format!("[{}]", run.text),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
