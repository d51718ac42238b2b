//! Response Formatting
//!
//! Renders upstream JSON as Telegram HTML. All upstream-derived text is
//! truncated first and HTML-escaped second, so the length limits refer to
//! the raw content the user would have seen.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title used when the payload has neither `title` nor `name`
pub const DEFAULT_TITLE: &str = "Free Fire Profile";

/// Max chars of the catch-all block for unlisted object keys
pub const OVERFLOW_PREVIEW_CHARS: usize = 800;

/// Max chars of a non-object payload dump
pub const RAW_DUMP_CHARS: usize = 1000;

/// Max chars of a single labeled value or title
pub const FIELD_VALUE_CHARS: usize = 200;

/// Marker appended to truncated text
pub const ELLIPSIS: char = '…';

/// Object keys rendered as labeled lines, in display order
pub const PRIORITY_KEYS: &[&str] = &[
    "uid",
    "player_id",
    "id",
    "nickname",
    "level",
    "region",
    "rank",
    "guild",
    "visits",
    "profile_url",
    "updated_at",
];

const TITLE_KEYS: &[&str] = &["title", "name"];

/// How a successful lookup is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    /// Priority key list plus a catch-all block
    #[default]
    Generic,
    /// Fixed visit summary with placeholders
    Summary,
}

/// Render an upstream payload in the given style
pub fn format_response(value: &Value, style: ResponseStyle) -> String {
    match style {
        ResponseStyle::Generic => format_generic(value),
        ResponseStyle::Summary => format_summary(value),
    }
}

/// Generic rendering: objects become a display record, anything else a code block
pub fn format_generic(value: &Value) -> String {
    match value {
        Value::Object(map) => DisplayRecord::from_object(map).render(),
        other => format!(
            "<code>{}</code>",
            escape_html(&truncate_with_ellipsis(&render_value(other), RAW_DUMP_CHARS))
        ),
    }
}

/// Summary rendering, falling back to a raw dump when the payload doesn't fit
pub fn format_summary(value: &Value) -> String {
    match SummaryRecord::from_value(value) {
        Ok(record) => record.render(),
        Err(FormatMismatch) => format!(
            "⚠️ <b>Unexpected response format</b>\n<pre>{}</pre>",
            escape_html(&truncate_with_ellipsis(&render_value(value), RAW_DUMP_CHARS))
        ),
    }
}

/// Ordered label/value lines drawn from [`PRIORITY_KEYS`]
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRecord {
    pub title: String,
    pub fields: Vec<(String, String)>,
    /// Truncated JSON of every key outside the allow-list
    pub overflow: Option<String>,
}

impl DisplayRecord {
    pub fn from_object(map: &Map<String, Value>) -> Self {
        let title = TITLE_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|v| is_truthy(v))
            .map(render_field)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let fields = PRIORITY_KEYS
            .iter()
            .filter_map(|key| match map.get(*key) {
                None | Some(Value::Null) => None,
                Some(v) => Some((humanize_key(key), render_field(v))),
            })
            .collect();

        let extras: Map<String, Value> = map
            .iter()
            .filter(|(k, _)| !PRIORITY_KEYS.contains(&k.as_str()) && !TITLE_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let overflow = if extras.is_empty() {
            None
        } else {
            Some(truncate_with_ellipsis(
                &Value::Object(extras).to_string(),
                OVERFLOW_PREVIEW_CHARS,
            ))
        };

        Self {
            title,
            fields,
            overflow,
        }
    }

    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.fields.len() + 3);
        lines.push(format!("<b>{}</b>", escape_html(&self.title)));
        for (label, value) in &self.fields {
            lines.push(format!("• <b>{}</b>: {}", escape_html(label), escape_html(value)));
        }
        if let Some(overflow) = &self.overflow {
            lines.push("\n<code>Other:</code>".to_string());
            lines.push(format!("<code>{}</code>", escape_html(overflow)));
        }
        lines.join("\n")
    }
}

/// Payload did not carry any of the summary fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unexpected response format")]
pub struct FormatMismatch;

/// Placeholder for a summary field the payload lacks
pub const MISSING_PLACEHOLDER: &str = "N/A";

/// Summary fields with the payload keys each one may come from
const SUMMARY_FIELDS: &[(&str, &[&str])] = &[
    ("UID", &["uid", "UID", "player_id", "id"]),
    ("Name", &["name", "nickname", "PlayerNickname", "player_name"]),
    ("Region", &["region", "Region"]),
    ("Level", &["level", "Level"]),
    ("Likes", &["likes", "Likes"]),
    ("Target", &["target", "Target"]),
    ("Success", &["success", "Success"]),
    ("Failed", &["failed", "Failed", "fail"]),
];

/// Fixed visit summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    /// One entry per summary field, `None` when absent
    pub fields: Vec<(&'static str, Option<String>)>,
}

impl SummaryRecord {
    pub fn from_value(value: &Value) -> Result<Self, FormatMismatch> {
        let map = value.as_object().ok_or(FormatMismatch)?;

        let fields: Vec<(&'static str, Option<String>)> = SUMMARY_FIELDS
            .iter()
            .map(|(label, keys)| {
                let found = keys
                    .iter()
                    .filter_map(|key| map.get(*key))
                    .find(|v| !v.is_null())
                    .map(render_field);
                (*label, found)
            })
            .collect();

        if fields.iter().all(|(_, v)| v.is_none()) {
            return Err(FormatMismatch);
        }
        Ok(Self { fields })
    }

    pub fn render(&self) -> String {
        let mut out = String::from("✅ <b>Visit Request Successful</b>\n");
        for (label, value) in &self.fields {
            let shown = value.as_deref().unwrap_or(MISSING_PLACEHOLDER);
            out.push_str(&format!("\n<b>{}</b>: {}", label, escape_html(shown)));
        }
        out
    }
}

/// Keep at most `max` chars, appending [`ELLIPSIS`] when anything was cut
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((idx, _)) => {
            let mut out = String::with_capacity(idx + ELLIPSIS.len_utf8());
            out.push_str(&s[..idx]);
            out.push(ELLIPSIS);
            out
        }
    }
}

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// `profile_url` -> `Profile Url`
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Strings verbatim, everything else as compact JSON
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A value shown on one labeled line, capped at [`FIELD_VALUE_CHARS`]
fn render_field(value: &Value) -> String {
    truncate_with_ellipsis(&render_value(value), FIELD_VALUE_CHARS)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
    }
}
