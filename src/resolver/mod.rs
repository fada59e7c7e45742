//! Render-time link resolution.
//!
//! Every link node in a rendered note is classified as external, a valid
//! internal reference, or a broken internal reference. Classification never
//! fails: malformed note links are broken whenever a set of valid ids is
//! known, and unparsable URLs fall back to their raw text for display.

use std::collections::HashSet;

use serde::Serialize;
use url::Url;

use crate::reference::{parse_href, Href};

/// Label shown for a valid internal reference.
pub const INTERNAL_LABEL: &str = "内部引用";
/// Label shown for a broken internal reference.
pub const BROKEN_LABEL: &str = "引用失效";
/// Tooltip for a valid internal reference.
pub const INTERNAL_TOOLTIP: &str = "跳转到笔记";
/// Tooltip for a broken internal reference.
pub const BROKEN_TOOLTIP: &str = "该笔记不存在或已被删除";
/// Suffix appended to the text of a broken reference.
pub const BROKEN_SUFFIX: &str = "(失效)";

/// Classification of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkKind {
    External,
    Internal { id: String },
    Broken { id: String },
}

impl LinkKind {
    pub fn is_internal(&self) -> bool {
        !matches!(self, LinkKind::External)
    }
}

/// What a click on a resolved link does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Select the note with this id; no browser navigation.
    Navigate(String),
    /// Open the href in a new tab/window.
    OpenExternal(String),
    /// Do nothing.
    Suppressed,
}

/// Receives the note id when a valid internal link is clicked.
pub trait Navigator {
    fn navigate(&mut self, note_id: &str);
}

impl<F> Navigator for F
where
    F: FnMut(&str),
{
    fn navigate(&mut self, note_id: &str) {
        self(note_id)
    }
}

/// Classify `href`.
///
/// With `valid_ids` supplied, an internal reference whose id is not in the
/// set is broken, and so is any `note://` link whose id is malformed.
/// Without it every `note://` link is treated as internal.
pub fn classify(href: &str, valid_ids: Option<&HashSet<String>>) -> LinkKind {
    match parse_href(href) {
        Href::Note(id) => match valid_ids {
            Some(ids) if !ids.contains(id) => LinkKind::Broken { id: id.to_string() },
            _ => LinkKind::Internal { id: id.to_string() },
        },
        Href::MalformedNote(id) => match valid_ids {
            Some(_) => LinkKind::Broken { id: id.to_string() },
            None => LinkKind::Internal { id: id.to_string() },
        },
        Href::Other => LinkKind::External,
    }
}

/// A classified link with its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLink {
    pub href: String,
    #[serde(flatten)]
    pub kind: LinkKind,
    /// Short "domain" label: host for external links, a status word for
    /// internal ones.
    pub label: String,
}

/// Classify `href` and compute its display label.
pub fn resolve(href: &str, valid_ids: Option<&HashSet<String>>) -> ResolvedLink {
    let kind = classify(href, valid_ids);
    let label = match kind {
        LinkKind::Internal { .. } => INTERNAL_LABEL.to_string(),
        LinkKind::Broken { .. } => BROKEN_LABEL.to_string(),
        LinkKind::External => external_label(href),
    };

    ResolvedLink {
        href: href.to_string(),
        kind,
        label,
    }
}

fn external_label(href: &str) -> String {
    let host = Url::parse(href).ok().and_then(|url| {
        let host = url.host_str()?.to_string();
        Some(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host,
        })
    });

    host.unwrap_or_else(|| href.to_string())
}

impl ResolvedLink {
    pub fn tooltip(&self) -> String {
        match self.kind {
            LinkKind::Internal { .. } => INTERNAL_TOOLTIP.to_string(),
            LinkKind::Broken { .. } => BROKEN_TOOLTIP.to_string(),
            LinkKind::External => format!("外链: {}", self.label),
        }
    }

    pub fn action(&self) -> LinkAction {
        match &self.kind {
            LinkKind::Internal { id } => LinkAction::Navigate(id.clone()),
            LinkKind::Broken { .. } => LinkAction::Suppressed,
            LinkKind::External => LinkAction::OpenExternal(self.href.clone()),
        }
    }

    /// Handle a click. Only a valid internal link reaches the navigator.
    pub fn click<N: Navigator + ?Sized>(&self, navigator: &mut N) -> LinkAction {
        let action = self.action();
        if let LinkAction::Navigate(ref id) = action {
            navigator.navigate(id);
        }
        action
    }
}
