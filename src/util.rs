use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};

static EMOJI_REPLACER: LazyLock<gh_emoji::Replacer> = LazyLock::new(gh_emoji::Replacer::new);

/// Expand GitHub emoji shortcodes (e.g. `:tada:` → 🎉) in the given text.
///
/// Returns `Cow::Borrowed` when no shortcodes are found, avoiding allocation.
pub(crate) fn expand_emoji(text: &str) -> Cow<'_, str> {
    EMOJI_REPLACER.replace_all(text)
}

/// Escape text for inclusion in HTML element content or a quoted attribute.
pub(crate) fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Format `dt` relative to `now` (e.g., `"2h"`, `"3d"`, `"1w"`).
pub(crate) fn format_relative_time(dt: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(dt);

    let minutes = duration.num_minutes();
    if minutes < 1 {
        return "now".to_owned();
    }
    if minutes < 60 {
        return format!("{minutes}m");
    }

    let hours = duration.num_hours();
    if hours < 24 {
        return format!("{hours}h");
    }

    let days = duration.num_days();
    if days < 7 {
        return format!("{days}d");
    }
    if days < 30 {
        return format!("{}w", days / 7);
    }
    if days < 365 {
        return format!("{}mo", days / 30);
    }

    format!("{}y", days / 365)
}
