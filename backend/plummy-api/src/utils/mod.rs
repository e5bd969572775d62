// Utility functions shared by handlers and services

use chrono::{DateTime, Utc};

/// Formats a timestamp relative to `now`: "just now", "5m ago", "2h ago",
/// "3d ago", "4mo ago", "1y ago".
pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds().max(0);
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d ago", days);
    }

    let months = days / 30;
    if months < 12 {
        return format!("{}mo ago", months);
    }

    format!("{}y ago", months / 12)
}

/// Turns an emoji short name like `thumbs_up` into a label like `Thumbs up`.
pub fn format_emoji_name(short_name: &str) -> String {
    let spaced = short_name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            let mut label = first.to_ascii_uppercase().to_string();
            label.push_str(chars.as_str());
            label
        }
        _ => spaced,
    }
}

/// `first_name` -> `firstName`
pub fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Escapes `%`, `_` and `\` so user input matches literally inside LIKE/ILIKE.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Substring pattern for ILIKE.
pub fn contains_pattern(input: &str) -> String {
    format!("%{}%", escape_like(input))
}
