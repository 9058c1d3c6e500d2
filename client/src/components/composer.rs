//! Question input, file picker and pending upload batch.
//!
//! Input is disabled while the assistant is typing so asks never overlap.

use leptos::prelude::*;

use crate::state::chat::ChatShell;

#[component]
pub fn Composer() -> impl IntoView {
    let shell = expect_context::<ChatShell>();
    let draft = RwSignal::new(String::new());
    let file_ref = NodeRef::<leptos::html::Input>::new();

    let busy = move || shell.view.with(|s| s.typing || s.user.is_none());

    let send = move || {
        if busy() {
            return;
        }
        let question = draft.get_untracked().trim().to_owned();
        if question.is_empty() {
            return;
        }
        draft.set(String::new());
        shell.ask(question);
    };

    let on_keydown = move |ev: leptos::ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send();
        }
    };

    let on_files = move |_ev: leptos::ev::Event| {
        #[cfg(feature = "hydrate")]
        {
            let Some(input) = file_ref.get_untracked() else {
                return;
            };
            leptos::task::spawn_local(async move {
                let files = crate::util::file_io::read_selected(&input).await;
                input.set_value("");
                if !files.is_empty() {
                    shell.select_files(files);
                }
            });
        }
    };

    let can_send = move || !busy() && !draft.with(|d| d.trim().is_empty());

    view! {
        <div class="chat-composer">
            {move || {
                let pending = shell.pending.get();
                (!pending.is_empty())
                    .then(|| {
                        view! {
                            <div class="chat-composer__pending">
                                {pending
                                    .into_iter()
                                    .enumerate()
                                    .map(|(index, name)| {
                                        view! {
                                            <span class="chat-composer__chip">
                                                {name}
                                                <button
                                                    class="chat-composer__chip-remove"
                                                    on:click=move |_| shell.remove_pending(index)
                                                >
                                                    "✕"
                                                </button>
                                            </span>
                                        }
                                    })
                                    .collect::<Vec<_>>()}
                                <button
                                    class="btn btn--primary chat-composer__upload"
                                    disabled=busy
                                    on:click=move |_| shell.upload()
                                >
                                    "Upload"
                                </button>
                            </div>
                        }
                    })
            }}
            <div class="chat-composer__row">
                <label class="chat-composer__attach" title="Attach files">
                    "📎"
                    <input
                        class="chat-composer__file"
                        type="file"
                        multiple=true
                        node_ref=file_ref
                        disabled=busy
                        on:change=on_files
                    />
                </label>
                <textarea
                    class="chat-composer__input"
                    rows="1"
                    placeholder="Ask about your project..."
                    disabled=busy
                    prop:value=move || draft.get()
                    on:input=move |ev| draft.set(event_target_value(&ev))
                    on:keydown=on_keydown
                ></textarea>
                <button class="btn btn--primary chat-composer__send" disabled=move || !can_send() on:click=move |_| send()>
                    "Send"
                </button>
            </div>
        </div>
    }
}
