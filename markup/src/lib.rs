//! Assistant reply sanitizer and linkifier.
//!
//! Turns raw assistant text into markup that the chat panel can inject as
//! HTML. The pipeline is pure and deterministic: it never fails, and text that
//! needs no transformation comes back trimmed and otherwise untouched.
//!
//! ## Pipeline
//!
//! | Step | Module | Effect |
//! |------|--------|--------|
//! | 1 | [`fence`] | Drop code-fence delimiters |
//! | 2 | [`links`] | `[label](target)` → anchor |
//! | 3 | [`autolink`] | Bare URLs → anchors (scheme, `www.`, bare domain) |
//! | 4 | [`render`] | Line breaks → `<br/>` |
//!
//! Later steps never re-process markup produced by earlier ones: the
//! autolinker skips anything inside an anchor or a tag (see [`scan`]).

pub mod autolink;
pub mod escape;
pub mod fence;
pub mod links;
pub mod scan;
pub mod tld;


pub use fence::strip_code_fences;

/// Line-break token emitted in place of `\n`.
pub const LINE_BREAK: &str = "<br/>";

/// Render raw assistant text into safe interactive markup.
#[must_use]
pub fn render(raw: &str) -> String {
    let stripped = strip_code_fences(raw);
    if stripped.is_empty() {
        return stripped;
    }

    let linked = links::convert_bracket_links(&stripped);
    let linked = autolink::linkify(&linked);
    convert_line_breaks(&linked)
}

/// Replace CRLF and LF with [`LINE_BREAK`]. Runs last so URL scanning sees
/// line breaks as ordinary whitespace.
#[must_use]
pub fn convert_line_breaks(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_owned();
    }
    text.replace("\r\n", "\n").replace('\n', LINE_BREAK)
}
