// src/notify/render.rs
use once_cell::sync::OnceCell;
use regex::Regex;

use super::NotificationPayload;
use crate::types::{DiffEvent, DiffKind, Proposal};

fn collapse_ws(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re.replace_all(s, " ").trim().to_string()
}

fn proposal_line(dao_name: &str, dao_slug: &str, p: &Proposal) -> String {
    let link = format!("https://tribeca.so/gov/{}/proposals/{}", dao_slug, p.index);
    match &p.meta {
        Some(meta) => format!("📜 New proposal for {dao_name}: {link} - {}", meta.title),
        // detail fetch failed for this index; the link still works
        None => format!("📜 New proposal for {dao_name}: {link}"),
    }
}

/// One line per new proposal, whitespace collapsed, whole message
/// truncated to exactly `max_len` chars. Truncation may cut a line
/// mid-word; trailing proposals are not dropped whole. Returns `None`
/// (with a warn) when the result is empty.
pub fn render(event: &DiffEvent, max_len: usize) -> Option<NotificationPayload> {
    let lines: Vec<String> = event
        .new_proposals
        .iter()
        .map(|p| proposal_line(&event.dao.name, &event.dao.slug, p))
        .collect();

    let joined = lines.join("\n");
    let collapsed = collapse_ws(&joined);
    let text: String = collapsed.chars().take(max_len).collect();

    if text.is_empty() {
        let (from, to) = match event.kind {
            DiffKind::Threshold { previous, current } => (previous, current),
            DiffKind::SetAdd => (0, event.new_proposals.len() as u64),
        };
        tracing::warn!(
            dao = %event.dao.name,
            governor = %event.dao.address,
            from,
            to,
            "rendered notification is empty, nothing to dispatch"
        );
        return None;
    }
    Some(NotificationPayload { text })
}
