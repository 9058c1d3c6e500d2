//! Paired user/assistant transcript submitted when a chat is flushed.
//!
//! DESIGN
//! ======
//! A user message opens a pair and the next assistant message closes it.
//! Consecutive user messages each open their own pair, leaving the earlier one
//! with an empty assistant side. A trailing user message is kept as an
//! incomplete pair. Assistant messages with no open pair start a pair with an
//! empty user side so nothing the user saw is dropped.

#[cfg(test)]
#[path = "transcript_test.rs"]
mod transcript_test;

use serde::Serialize;

use crate::types::{ChatMessage, Role};

/// Conversation number the storage endpoint expects for a flushed chat.
const TRANSCRIPT_CONVERSATION_ID: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnPair {
    pub message_id: usize,
    pub user: String,
    pub assistant: String,
}

impl TurnPair {
    fn is_empty(&self) -> bool {
        self.user.is_empty() && self.assistant.is_empty()
    }
}

/// Body of the `conversation_json` form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub conversation_id: u32,
    pub messages: Vec<TurnPair>,
}

impl Transcript {
    #[must_use]
    pub fn from_messages(messages: &[ChatMessage]) -> Self {
        Self { conversation_id: TRANSCRIPT_CONVERSATION_ID, messages: pair_turns(messages) }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Serialize for the wire.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; the struct has no maps so this does not
    /// happen in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Group messages into numbered user/assistant pairs.
#[must_use]
pub fn pair_turns(messages: &[ChatMessage]) -> Vec<TurnPair> {
    let mut pairs = Vec::new();
    let mut current = TurnPair::default();

    for msg in messages {
        match msg.role {
            Role::User => {
                if !current.is_empty() {
                    push_pair(&mut pairs, std::mem::take(&mut current));
                }
                current.user.clone_from(&msg.text);
            }
            Role::Assistant => {
                current.assistant.clone_from(&msg.text);
                push_pair(&mut pairs, std::mem::take(&mut current));
            }
        }
    }
    if !current.is_empty() {
        push_pair(&mut pairs, current);
    }
    pairs
}

fn push_pair(pairs: &mut Vec<TurnPair>, mut pair: TurnPair) {
    pair.message_id = pairs.len() + 1;
    pairs.push(pair);
}
