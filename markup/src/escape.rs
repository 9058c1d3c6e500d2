//! HTML escaping helpers.

/// Escape `<` and `>` only. Used for bracket-link labels, which may carry
/// ampersands or quotes the author intended literally.
#[must_use]
pub fn escape_angle_brackets(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

/// Escape `<`, `>`, `"` and `'` for visible URL labels.
#[must_use]
pub fn escape_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape a value placed inside a double-quoted attribute.
#[must_use]
pub fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Build the anchor element used for every generated link.
#[must_use]
pub fn anchor(href: &str, label_html: &str) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"external-link\">{label_html}</a>",
        escape_attr(href)
    )
}

/// Prefix `https://` unless `target` already names one of the accepted schemes.
#[must_use]
pub fn with_scheme(target: &str, schemes: &[&str]) -> String {
    if schemes.iter().any(|s| target.starts_with(s)) {
        target.to_owned()
    } else {
        format!("https://{target}")
    }
}
