//! HTML body of a change alert.
//!
//! Three sections: the rendered diff, the watch configuration, and the full
//! observation history as pretty-printed JSON.

use super::ChangeEvent;

/// Render the alert body for `event`.
pub fn render_html(event: &ChangeEvent) -> String {
    let diff = escape_html(&event.diff.render()).replace('\n', "<br>");
    let config = pretty_json(&event.config);
    let history = pretty_json(&event.history);

    format!(
        "<h2>Diff</h2><p>{diff}</p>\n\
         <h2>Config</h2><pre>{}</pre>\n\
         <h2>History</h2><pre>{}</pre>\n",
        escape_html(&config),
        escape_html(&history),
    )
}

fn pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

/// Escape text for inclusion in HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
