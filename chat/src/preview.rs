//! Sidebar preview labels and the local fallback replies.

#[cfg(test)]
#[path = "preview_test.rs"]
mod preview_test;

/// Longest preview before truncation.
pub const PREVIEW_MAX_CHARS: usize = 25;

/// Label shown for a chat with nothing to preview yet.
pub const NEW_CHAT_LABEL: &str = "New chat";

/// Trim `text` and cut it to [`PREVIEW_MAX_CHARS`] characters plus `…`.
/// Blank text yields `empty_label`.
#[must_use]
pub fn format_chat_preview(text: &str, empty_label: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return empty_label.to_owned();
    }
    if trimmed.chars().count() <= PREVIEW_MAX_CHARS {
        return trimmed.to_owned();
    }
    let mut cut: String = trimmed.chars().take(PREVIEW_MAX_CHARS).collect();
    cut.push('…');
    cut
}

/// Local reply used when the knowledge-base path fails without an explanation.
#[must_use]
pub fn canned_reply(question: &str) -> &'static str {
    let q = question.trim().to_lowercase();
    if matches!(q.as_str(), "hi" | "hello" | "hey" | "hii") {
        "Hello! How can I help you today?"
    } else if q.contains("who are you") || q.contains("what are you") {
        "I'm your PM Portal assistant 🤖."
    } else if q.contains("help") || q.contains("support") {
        "I'm here to help! You can ask me questions about the PM Portal features, or I can assist with sprint planning and risk assessments."
    } else {
        "I didn't quite get that. Can you rephrase?"
    }
}
