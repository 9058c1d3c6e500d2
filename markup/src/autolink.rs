//! Bare-URL linkification.
//!
//! Three passes, most specific first: explicit `http(s)://` URLs, `www.`
//! hosts, then bare domains such as `example.com:8080/path`. Each pass walks
//! the buffer produced by the previous one and only scans [`Context::Text`]
//! segments, so anchors emitted earlier are never linked twice and URLs
//! sitting in tags or attributes are left alone.
//!
//! Trailing sentence punctuation is moved outside the generated anchor
//! unless the candidate ends in a whitelisted TLD.

#[cfg(test)]
#[path = "autolink_test.rs"]
mod autolink_test;

use crate::escape::{anchor, escape_label, with_scheme};
use crate::scan::{Context, segments};
use crate::tld::ends_with_common_tld;

/// Schemes that mark an href as already absolute.
pub const URL_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Characters stripped from the end of a candidate as sentence punctuation.
pub const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

const MAX_LABEL_LEN: usize = 63;
const MAX_PORT_DIGITS: usize = 5;

/// One linkification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// `http://…` and `https://…`.
    Scheme,
    /// `www.…`.
    Www,
    /// `label.label[.tld][:port][/path]`.
    BareDomain,
}

impl Pass {
    /// Passes in the order they must run.
    pub const ORDER: [Pass; 3] = [Pass::Scheme, Pass::Www, Pass::BareDomain];

    /// Length of the fixed prefix a match must extend past.
    fn prefix_len(self, candidate: &str) -> usize {
        match self {
            Self::Scheme => URL_SCHEMES
                .iter()
                .find(|s| candidate.starts_with(*s))
                .map_or(0, |s| s.len()),
            Self::Www => "www.".len(),
            Self::BareDomain => 0,
        }
    }
}

/// Run every pass over `text`.
#[must_use]
pub fn linkify(text: &str) -> String {
    Pass::ORDER
        .iter()
        .fold(text.to_owned(), |acc, pass| linkify_pass(&acc, *pass))
}

/// Run a single pass, touching only plain-text segments.
#[must_use]
pub fn linkify_pass(text: &str, pass: Pass) -> String {
    let mut out = String::with_capacity(text.len());
    for seg in segments(text) {
        let slice = &text[seg.start..seg.end];
        if seg.context == Context::Text {
            link_segment(slice, pass, &mut out);
        } else {
            out.push_str(slice);
        }
    }
    out
}

fn link_segment(segment: &str, pass: Pass, out: &mut String) {
    let mut i = 0;
    let mut copied = 0;
    while i < segment.len() {
        if let Some(len) = match_at(segment, i, pass) {
            let candidate = &segment[i..i + len];
            if emit_link(candidate, pass, &segment[copied..i], out) {
                i += len;
                copied = i;
                continue;
            }
        }
        i += segment[i..].chars().next().map_or(1, char::len_utf8);
    }
    out.push_str(&segment[copied..]);
}

/// Emit pending literal text plus the anchor for `candidate`.
///
/// Returns false (emitting nothing) when trimming leaves nothing past the
/// pass prefix, e.g. a lone `https://.`.
fn emit_link(candidate: &str, pass: Pass, pending: &str, out: &mut String) -> bool {
    let (clean, trailing) = split_trailing_punctuation(candidate);
    if clean.len() <= pass.prefix_len(clean) {
        return false;
    }

    let href = with_scheme(clean, &URL_SCHEMES);
    out.push_str(pending);
    out.push_str(&anchor(&href, &escape_label(clean)));
    out.push_str(trailing);
    true
}

/// Split sentence punctuation off the end of a candidate.
///
/// A candidate ending in a whitelisted TLD keeps every character.
#[must_use]
pub fn split_trailing_punctuation(candidate: &str) -> (&str, &str) {
    if ends_with_common_tld(candidate) {
        return (candidate, "");
    }
    let clean = candidate.trim_end_matches(TRAILING_PUNCTUATION);
    (clean, &candidate[clean.len()..])
}

// =============================================================================
// MATCHERS
// =============================================================================

/// Byte length of a `pass` match starting at `i`, if any.
fn match_at(s: &str, i: usize, pass: Pass) -> Option<usize> {
    let rest = &s[i..];
    let prev = s[..i].chars().next_back();
    match pass {
        Pass::Scheme => {
            if prev.is_some_and(char::is_alphanumeric) {
                return None;
            }
            let prefix = URL_SCHEMES.iter().find(|p| rest.starts_with(*p))?;
            let body = url_run_len(&rest[prefix.len()..]);
            (body > 0).then_some(prefix.len() + body)
        }
        Pass::Www => {
            if prev.is_some_and(blocks_host_start) {
                return None;
            }
            let body = rest.strip_prefix("www.").map(url_run_len)?;
            (body > 0).then_some("www.".len() + body)
        }
        Pass::BareDomain => {
            if prev.is_some_and(blocks_host_start) {
                return None;
            }
            match_bare_domain(rest)
        }
    }
}

/// Characters that may not directly precede a host match: they would make
/// it the tail of a word, a longer host, an email address or a path.
fn blocks_host_start(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '@' | '/' | ':')
}

fn is_url_char(c: char) -> bool {
    !c.is_whitespace()
        && !matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '\\' | '^' | '`' | '[' | ']' | '(' | ')')
}

fn url_run_len(s: &str) -> usize {
    s.char_indices()
        .find(|(_, c)| !is_url_char(*c))
        .map_or(s.len(), |(idx, _)| idx)
}

/// Match `label(.label)+` whose last label is 2+ ASCII letters, then an
/// optional `:port` and `/path`.
fn match_bare_domain(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut labels: Vec<(usize, usize)> = Vec::new();
    let mut pos = 0;

    loop {
        let len = label_len(&bytes[pos..]);
        if len == 0 {
            break;
        }
        labels.push((pos, pos + len));
        pos += len;
        if bytes.get(pos) == Some(&b'.') && label_len(&bytes[pos + 1..]) > 0 {
            pos += 1;
        } else {
            break;
        }
    }

    // Back off to the last label that can serve as a TLD.
    let tld_idx = (1..labels.len())
        .rev()
        .find(|&k| is_tld_shaped(&bytes[labels[k].0..labels[k].1]))?;
    let mut end = labels[tld_idx].1;

    if bytes.get(end) == Some(&b':') {
        let digits = bytes[end + 1..]
            .iter()
            .take(MAX_PORT_DIGITS)
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits > 0 {
            end += 1 + digits;
        }
    }

    if bytes.get(end) == Some(&b'/') {
        end += 1 + url_run_len(&s[end + 1..]);
    }

    Some(end)
}

fn label_len(bytes: &[u8]) -> usize {
    if !bytes.first().is_some_and(u8::is_ascii_alphanumeric) {
        return 0;
    }
    let len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'-')
        .count()
        .min(MAX_LABEL_LEN);
    // Labels never end in a hyphen.
    bytes[..len]
        .iter()
        .rposition(u8::is_ascii_alphanumeric)
        .map_or(0, |p| p + 1)
}

fn is_tld_shaped(label: &[u8]) -> bool {
    label.len() >= 2 && label.iter().all(u8::is_ascii_alphabetic)
}
