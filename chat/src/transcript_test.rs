use super::*;

fn msg(role: Role, text: &str) -> ChatMessage {
    ChatMessage { text: text.to_owned(), role, timestamp: 0 }
}

fn pair(id: usize, user: &str, assistant: &str) -> TurnPair {
    TurnPair { message_id: id, user: user.to_owned(), assistant: assistant.to_owned() }
}

// =============================================================================
// pair_turns
// =============================================================================

#[test]
fn empty_conversation_has_no_pairs() {
    assert!(pair_turns(&[]).is_empty());
    assert!(Transcript::from_messages(&[]).is_empty());
}

#[test]
fn dangling_user_message_is_kept_incomplete() {
    let messages = [msg(Role::User, "A"), msg(Role::Assistant, "B"), msg(Role::User, "C")];
    assert_eq!(pair_turns(&messages), vec![pair(1, "A", "B"), pair(2, "C", "")]);
}

#[test]
fn consecutive_user_messages_open_separate_pairs() {
    let messages = [msg(Role::User, "A"), msg(Role::User, "B"), msg(Role::Assistant, "C")];
    assert_eq!(pair_turns(&messages), vec![pair(1, "A", ""), pair(2, "B", "C")]);
}

#[test]
fn leading_assistant_message_gets_empty_user() {
    let messages = [msg(Role::Assistant, "welcome"), msg(Role::User, "hi"), msg(Role::Assistant, "hello")];
    assert_eq!(pair_turns(&messages), vec![pair(1, "", "welcome"), pair(2, "hi", "hello")]);
}

// =============================================================================
// Wire form
// =============================================================================

#[test]
fn json_shape_matches_storage_contract() {
    let transcript = Transcript::from_messages(&[msg(Role::User, "A"), msg(Role::Assistant, "B")]);
    let value: serde_json::Value = serde_json::from_str(&transcript.to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "conversation_id": 1,
            "messages": [{ "message_id": 1, "user": "A", "assistant": "B" }]
        })
    );
}
