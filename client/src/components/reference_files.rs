//! Reference file drawer: knowledge-base marks, download, delete and the
//! playbook bootstrap.

use chat::types::ReferenceFile;
use leptos::prelude::*;

use crate::state::chat::ChatShell;

/// Human-readable size such as `12.4 KB`.
fn format_size(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes else {
        return String::new();
    };
    #[allow(clippy::cast_precision_loss)]
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 { format!("{kb:.1} KB") } else { format!("{:.1} MB", kb / 1024.0) }
}

#[component]
pub fn ReferenceFiles() -> impl IntoView {
    let shell = expect_context::<ChatShell>();
    let busy = move || shell.view.with(|s| s.typing);

    view! {
        <div class="chat-sidebar__section">
            <div class="chat-files__actions">
                <button class="btn btn--primary" disabled=busy on:click=move |_| shell.start_project()>
                    "Start project"
                </button>
                <button class="btn btn--subtle" on:click=move |_| shell.refresh_files()>
                    "Refresh"
                </button>
            </div>
            {move || {
                let files = shell.files.get();
                if files.is_empty() {
                    return view! { <div class="chat-sidebar__empty">"No reference files"</div> }.into_any();
                }
                let marked = shell.view.with(|s| s.knowledge_base.clone());
                files
                    .into_iter()
                    .map(|file| file_row(shell, file, &marked))
                    .collect::<Vec<_>>()
                    .into_any()
            }}
        </div>
    }
}

fn file_row(
    shell: ChatShell,
    file: ReferenceFile,
    marked: &std::collections::BTreeSet<chat::types::FileId>,
) -> impl IntoView {
    let id = file.id;
    let is_marked = marked.contains(&id);
    let download_name = file.file_name.clone();

    view! {
        <div class="chat-files__row" class:chat-files__row--inactive=!file.is_active>
            <label class="chat-files__mark" title="Use for project knowledge base">
                <input type="checkbox" prop:checked=is_marked on:change=move |_| shell.toggle_knowledge_base(id) />
            </label>
            <span class="chat-files__name">{file.file_name}</span>
            <span class="chat-files__size">{format_size(file.file_size)}</span>
            <button
                class="chat-files__download"
                title="Download"
                on:click=move |_| shell.download_file(id, download_name.clone())
            >
                "⬇"
            </button>
            <button class="chat-files__delete" title="Delete" on:click=move |_| shell.delete_file(id)>
                "🗑"
            </button>
        </div>
    }
}
