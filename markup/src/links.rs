//! Explicit `[label](target)` link conversion.

#[cfg(test)]
#[path = "links_test.rs"]
mod links_test;

use crate::escape::{anchor, escape_angle_brackets, with_scheme};

/// Schemes a bracket-link target may already carry.
pub const LINK_SCHEMES: [&str; 3] = ["http://", "https://", "mailto:"];

/// Convert every well-formed `[label](target)` into an anchor.
///
/// Malformed syntax (unbalanced brackets, space between `]` and `(`, empty
/// label or target) is left as literal text.
#[must_use]
pub fn convert_bracket_links(text: &str) -> String {
    if !text.contains("](") {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];
        match parse_bracket_link(candidate) {
            Some((label, target, consumed)) => {
                let href = with_scheme(target, &LINK_SCHEMES);
                out.push_str(&anchor(&href, &escape_angle_brackets(label)));
                rest = &candidate[consumed..];
            }
            None => {
                out.push('[');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse `[label](target)` at the start of `s`.
///
/// Returns the label, the trimmed target and the byte length consumed.
fn parse_bracket_link(s: &str) -> Option<(&str, &str, usize)> {
    let body = s.strip_prefix('[')?;
    let close = body.find(']')?;
    let label = &body[..close];
    if label.is_empty() {
        return None;
    }

    let after_label = body[close + 1..].strip_prefix('(')?;
    let end = after_label.find(')')?;
    let target = after_label[..end].trim();
    if target.is_empty() {
        return None;
    }

    // '[' + label + ']' + '(' + raw target + ')'
    let consumed = 1 + close + 1 + 1 + end + 1;
    Some((label, target, consumed))
}
