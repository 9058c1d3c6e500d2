//! Code-fence removal.
//!
//! Assistant replies often arrive wrapped in a fenced block (usually
//! ```` ```html ````) even though the content is meant to be rendered, not
//! shown as code. Every fence delimiter is removed; an opening language tag is
//! removed together with it when the tag ends its line.

#[cfg(test)]
#[path = "fence_test.rs"]
mod fence_test;

/// Fence delimiter token.
pub const FENCE: &str = "```";

/// Longest run of word characters still treated as a language tag.
pub const MAX_LANG_TAG_LEN: usize = 20;

/// Remove every fence delimiter (and its language tag) and trim the result.
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    if !text.contains(FENCE) {
        return text.trim().to_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(FENCE) {
        out.push_str(&rest[..idx]);
        rest = skip_fence_tail(&rest[idx + FENCE.len()..]);
    }
    out.push_str(rest);
    out.trim().to_owned()
}

/// Skip what follows a delimiter: `tag[blanks]\n`, or `[blanks]\n`, or nothing.
fn skip_fence_tail(after: &str) -> &str {
    let tag_len = after.bytes().take_while(|b| is_tag_byte(*b)).count();
    if tag_len > 0 && tag_len <= MAX_LANG_TAG_LEN {
        if let Some(tail) = through_line_break(&after[tag_len..]) {
            return tail;
        }
    }
    through_line_break(after).unwrap_or(after)
}

/// If `s` is blank up to the next line break (or its end), return the text
/// after that break.
fn through_line_break(s: &str) -> Option<&str> {
    let blanks = s.bytes().take_while(|b| matches!(b, b' ' | b'\t' | b'\r')).count();
    let tail = &s[blanks..];
    if tail.is_empty() {
        return Some(tail);
    }
    tail.strip_prefix('\n')
}

fn is_tag_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'+')
}
