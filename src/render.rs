//! Dashboard rendering.
//!
//! `render` turns a store snapshot into the ordered list of entries to show;
//! it is pure, so the dashboard can be rebuilt from any fresh snapshot.
//! `render_page` lays those entries out as the HTML document.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::config::types::FilterConfig;
use crate::types::{ItemId, ItemMap, ItemState, NEVER_VISITED, VisitedMap};
use crate::util::{escape_html, expand_emoji, format_relative_time};

/// One pull request as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntry {
    pub id: ItemId,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub state: ItemState,
    /// Updated since the user last marked it visited.
    pub unread: bool,
    /// Changed files under the include prefixes.
    pub files: Vec<String>,
}

/// Select, classify and order the items to display.
///
/// Items failing the path filter are skipped, as are closed items the user
/// has already seen in their final state. The rest are sorted newest first,
/// ties broken by ascending id.
pub fn render(items: &ItemMap, visited: &VisitedMap, filters: &FilterConfig) -> Vec<DisplayEntry> {
    let mut entries: Vec<DisplayEntry> = items
        .iter()
        .filter(|(_, record)| filters.admits(record.files()))
        .filter_map(|(&id, record)| {
            let seen_at = visited.get(&id).copied().unwrap_or(NEVER_VISITED);
            let unread = seen_at < record.updated_at;
            if record.state == ItemState::Closed && !unread {
                return None;
            }
            Some(DisplayEntry {
                id,
                url: record.url.clone(),
                title: record.title.clone(),
                description: record.description.clone(),
                updated_at: record.updated_at,
                state: record.state,
                unread,
                files: filters
                    .matching(record.files())
                    .into_iter()
                    .map(str::to_owned)
                    .collect(),
            })
        })
        .collect();

    entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
    entries
}

const STYLE: &str = "
body { padding-left: 20px; padding-right: 200px; font-family: sans-serif; }
pre { white-space: pre-wrap; }
a { color: blue; text-decoration: none; }
a i, a b { text-decoration: underline; }
.meta { color: gray; font-size: smaller; }
";

/// Lay out `entries` as a complete HTML page that reloads itself every
/// `refresh_seconds`. `now` anchors the relative "updated" labels.
pub fn render_page(entries: &[DisplayEntry], refresh_seconds: u32, now: DateTime<Utc>) -> String {
    let mut html = String::with_capacity(1024 + entries.len() * 512);
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\" />\
         <meta http-equiv=\"refresh\" content=\"{refresh_seconds}\" />\
         <title>Pull requests</title><style>{STYLE}</style></head><body>"
    );
    if entries.is_empty() {
        html.push_str("<p class=\"meta\">Nothing needs attention.</p>");
    }
    for entry in entries {
        write_entry(&mut html, entry, &now);
    }
    html.push_str("</body></html>");
    html
}

fn write_entry(html: &mut String, entry: &DisplayEntry, now: &DateTime<Utc>) {
    let id = entry.id;
    let title = format!("#{id} {}", expand_emoji(&entry.title));
    let title = escape_html(&title);
    let (open_tag, close_tag) = if entry.unread {
        ("<b>", "</b>")
    } else {
        ("<i>", "</i>")
    };
    let state = match entry.state {
        ItemState::Open => "",
        ItemState::Closed => " (closed)",
    };

    let _ = write!(
        html,
        "<details><summary><a href=\"{url}\">{open_tag}{title}{close_tag}</a>{state} \
         <span class=\"meta\">{age}</span> \
         <a href=\"?operation=read&amp;item={id}&amp;time={time}\">read</a> \
         <a href=\"?operation=read&amp;item={id}&amp;time=0\">unread</a></summary>",
        url = escape_html(&entry.url),
        age = format_relative_time(&entry.updated_at, now),
        time = entry.updated_at.timestamp(),
    );
    if let Some(ref description) = entry.description {
        let _ = write!(html, "<pre>{}</pre>", escape_html(description));
    }
    html.push_str("<ul>");
    for file in &entry.files {
        let _ = write!(html, "<li>{}</li>", escape_html(file));
    }
    html.push_str("</ul></details>");
}
