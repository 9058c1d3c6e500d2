//! Conversation timeline.
//!
//! Assistant text arrives already sanitized by `markup::render` (or fence
//! stripped for fetched history) and is injected as HTML; user text is
//! rendered as plain text.

use chat::types::Role;
use leptos::prelude::*;

use crate::state::chat::ChatShell;

#[component]
pub fn MessageList() -> impl IntoView {
    let shell = expect_context::<ChatShell>();
    let list_ref = NodeRef::<leptos::html::Div>::new();

    Effect::new(move || {
        let count = shell.view.with(|s| s.messages.len());
        let typing = shell.view.with(|s| s.typing);
        let _ = (count, typing);

        #[cfg(feature = "hydrate")]
        {
            if let Some(el) = list_ref.get() {
                el.set_scroll_top(el.scroll_height());
            }
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = list_ref;
    });

    view! {
        <div class="chat-messages" node_ref=list_ref>
            {move || {
                let state = shell.view.get();
                if state.loading_history {
                    return view! { <div class="chat-messages__empty">"Loading conversation..."</div> }.into_any();
                }
                if state.messages.is_empty() {
                    return view! {
                        <div class="chat-messages__empty">"Ask anything about your project."</div>
                    }
                        .into_any();
                }
                state
                    .messages
                    .into_iter()
                    .map(|message| {
                        let is_assistant = message.role == Role::Assistant;
                        view! {
                            <div
                                class="chat-message"
                                class:chat-message--assistant=is_assistant
                                class:chat-message--user=!is_assistant
                            >
                                {if is_assistant {
                                    view! { <div class="chat-message__body" inner_html=message.text></div> }
                                        .into_any()
                                } else {
                                    view! { <div class="chat-message__body">{message.text}</div> }.into_any()
                                }}
                            </div>
                        }
                    })
                    .collect::<Vec<_>>()
                    .into_any()
            }}
            {move || {
                shell
                    .view
                    .with(|s| s.typing)
                    .then(|| view! { <div class="chat-messages__typing">"Thinking..."</div> })
            }}
        </div>
    }
}
