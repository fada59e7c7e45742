//! Reference context assembly for AI prompts.

use crate::entity::Note;

use super::{resolve_references, scan_references};

const REFERENCES_HEADER: &str = "--- Referenced Notes (引用内容) ---";
const REFERENCES_FOOTER: &str = "--- End of References ---";
const MAIN_CONTENT_HEADER: &str = "--- Main Content (文章主体) ---";

/// Build the document handed to an assistant when analysing `note`.
///
/// The referenced notes are inlined (content truncated to `snippet_chars`
/// characters) ahead of the note's own content. The references block is
/// emitted whenever the content mentions any reference id, even if none of
/// them resolve.
pub fn build_note_context(note: &Note, notes: &[Note], snippet_chars: usize) -> String {
    let title = if note.title.is_empty() {
        "Untitled"
    } else {
        note.title.as_str()
    };
    let mut context = format!("Title: {}\nTags: {}\n\n", title, note.tags.join(", "));

    if !scan_references(&note.content).is_empty() {
        context.push_str(REFERENCES_HEADER);
        context.push('\n');
        for target in resolve_references(note, notes).found {
            context.push_str(&format!(
                "Reference ID: {}\nTitle: {}\nTags: {}\nContent:\n{}\n\n",
                target.id,
                target.title,
                target.tags.join(", "),
                snippet(&target.content, snippet_chars)
            ));
        }
        context.push_str(REFERENCES_FOOTER);
        context.push_str("\n\n");
    }

    context.push_str(MAIN_CONTENT_HEADER);
    context.push('\n');
    context.push_str(&note.content);
    context
}

fn snippet(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
