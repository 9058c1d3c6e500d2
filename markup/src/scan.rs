//! Markup context scanner.
//!
//! Splits a partially-rendered buffer into segments so the autolinker only
//! touches plain text. One forward pass tracks two flags: whether the cursor
//! is inside an anchor element (`<a …>` … `</a>`) and whether it is inside a
//! tag or attribute (`<…>`, including quoted attribute values, or a CSS
//! `url(…)` run).

#[cfg(test)]
#[path = "scan_test.rs"]
mod scan_test;

/// What a segment of the buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Plain text outside any anchor; safe to linkify.
    Text,
    /// Text between an anchor's open and close tags.
    Anchor,
    /// A tag (with its attributes) or a `url(…)` run.
    Attribute,
}

/// A contiguous byte range of the buffer sharing one [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub context: Context,
}

const CSS_URL_OPEN: &str = "url(";

/// Scan `text` into ordered, non-overlapping segments covering it entirely.
#[must_use]
pub fn segments(text: &str) -> Vec<Segment> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut anchor_depth = 0usize;
    let mut seg_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let tag = if bytes[i] == b'<' && starts_tag(bytes, i) { tag_end(bytes, i) } else { None };
        if let Some(end) = tag {
            push_text(&mut out, seg_start, i, anchor_depth);
            match anchor_tag_kind(&text[i..end]) {
                Some(AnchorTag::Open) => anchor_depth += 1,
                Some(AnchorTag::Close) => anchor_depth = anchor_depth.saturating_sub(1),
                None => {}
            }
            out.push(Segment { start: i, end, context: Context::Attribute });
            seg_start = end;
            i = end;
            continue;
        }

        if bytes[i] == b'u'
            && text[i..].starts_with(CSS_URL_OPEN)
            && (i == 0 || !bytes[i - 1].is_ascii_alphanumeric())
        {
            push_text(&mut out, seg_start, i, anchor_depth);
            let end = text[i..].find(')').map_or(bytes.len(), |p| i + p + 1);
            out.push(Segment { start: i, end, context: Context::Attribute });
            seg_start = end;
            i = end;
            continue;
        }

        i += 1;
    }

    push_text(&mut out, seg_start, bytes.len(), anchor_depth);
    out
}

fn push_text(out: &mut Vec<Segment>, start: usize, end: usize, anchor_depth: usize) {
    if start >= end {
        return;
    }
    let context = if anchor_depth > 0 { Context::Anchor } else { Context::Text };
    out.push(Segment { start, end, context });
}

/// `<` opens a tag only when followed by a letter, `/` or `!`.
fn starts_tag(bytes: &[u8], i: usize) -> bool {
    bytes
        .get(i + 1)
        .is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!'))
}

/// Byte index just past the `>` closing the tag at `start`, honoring quoted
/// attribute values. `None` when another `<` or the end of the buffer comes
/// first; the `<` is then plain text.
fn tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut j = start + 1;
    while j < bytes.len() {
        let b = bytes[j];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(j + 1),
            None if b == b'<' => return None,
            None => {}
        }
        j += 1;
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorTag {
    Open,
    Close,
}

fn anchor_tag_kind(tag: &str) -> Option<AnchorTag> {
    let inner = tag.strip_prefix('<')?;
    let (closing, name_start) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name_len = name_start.bytes().take_while(u8::is_ascii_alphanumeric).count();
    if !name_start[..name_len].eq_ignore_ascii_case("a") {
        return None;
    }
    if closing {
        Some(AnchorTag::Close)
    } else if tag.ends_with("/>") {
        None
    } else {
        Some(AnchorTag::Open)
    }
}
