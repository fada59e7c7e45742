//! Markdown to HTML rendering with note-aware links.
//!
//! Extends pulldown-cmark with:
//! - note references (`note://<id>` or a bare id as link target) rendered as
//!   in-app links, or as struck-through text when the target is gone
//! - external links opening in a new window
//! - `attachment:<id>` images resolved from the note's attachments

use std::collections::HashSet;

use pulldown_cmark::{html::push_html, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};

use crate::entity::Note;
use crate::resolver::{resolve, LinkKind, ResolvedLink, BROKEN_SUFFIX};

/// Output of a render pass.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub html: String,
    /// Every link encountered, in document order.
    pub links: Vec<ResolvedLink>,
}

/// Render a note's content, resolving attachments first.
pub fn render_note(note: &Note, valid_ids: Option<&HashSet<String>>) -> Rendered {
    render_markdown(&note.resolve_attachments(), valid_ids)
}

/// Render Markdown text, classifying each link against `valid_ids`.
pub fn render_markdown(text: &str, valid_ids: Option<&HashSet<String>>) -> Rendered {
    let parser = Parser::new_ext(text, get_options());
    let mut links = Vec::new();
    let events = transform_events(parser, valid_ids, &mut links);

    let mut html = String::new();
    push_html(&mut html, events.into_iter());
    Rendered { html, links }
}

fn get_options() -> Options {
    Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS
}

fn transform_events<'a>(
    parser: Parser<'a>,
    valid_ids: Option<&HashSet<String>>,
    links: &mut Vec<ResolvedLink>,
) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    // Closing markup for each open link.
    let mut closers: Vec<String> = Vec::new();

    for event in parser {
        match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                ..
            }) => {
                let link = match link_type {
                    // The parser strips the scheme from `<user@host>` autolinks
                    LinkType::Email => resolve(&format!("mailto:{}", dest_url), valid_ids),
                    _ => resolve(&dest_url, valid_ids),
                };
                let (open, close) = link_markup(&link);
                events.push(Event::Html(CowStr::from(open)));
                closers.push(close);
                links.push(link);
            }
            Event::End(TagEnd::Link) => {
                let close = closers.pop().unwrap_or_else(|| "</a>".to_string());
                events.push(Event::Html(CowStr::from(close)));
            }
            other => events.push(other),
        }
    }

    events
}

fn link_markup(link: &ResolvedLink) -> (String, String) {
    let href = escape_attr(&link.href);
    let title = escape_attr(&link.tooltip());

    match &link.kind {
        LinkKind::Internal { id } => (
            format!(
                r#"<a href="{}" class="note-ref" data-note-id="{}" title="{}">"#,
                href,
                escape_attr(id),
                title
            ),
            "</a>".to_string(),
        ),
        LinkKind::Broken { id } => (
            format!(
                r#"<span class="note-ref-broken" data-note-id="{}" title="{}"><del>"#,
                escape_attr(id),
                title
            ),
            format!(
                r#"</del><span class="note-ref-suffix">{}</span></span>"#,
                BROKEN_SUFFIX
            ),
        ),
        LinkKind::External => (
            format!(
                r#"<a href="{}" target="_blank" rel="noreferrer" title="{}">"#,
                href, title
            ),
            "</a>".to_string(),
        ),
    }
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
