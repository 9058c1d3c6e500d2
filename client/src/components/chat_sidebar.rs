//! Drawer listing recent chats, the project tree and reference files.

use chat::preview::{NEW_CHAT_LABEL, format_chat_preview};
use chat::types::{ConversationRef, Project};
use leptos::prelude::*;

use crate::components::reference_files::ReferenceFiles;
use crate::state::chat::{ChatShell, is_active_chat};
use crate::state::ui::{ChatUiState, DrawerTab};

fn conversation_label(conversation: &ConversationRef) -> String {
    if conversation.title.trim().is_empty() {
        format_chat_preview(&conversation.preview, NEW_CHAT_LABEL)
    } else {
        format_chat_preview(&conversation.title, NEW_CHAT_LABEL)
    }
}

#[component]
pub fn ChatSidebar() -> impl IntoView {
    let ui = expect_context::<RwSignal<ChatUiState>>();
    let tab = move || ui.with(|u| u.drawer_tab);

    view! {
        <aside class="chat-sidebar">
            {move || match tab() {
                DrawerTab::Chats => view! { <SessionList /> }.into_any(),
                DrawerTab::Projects => view! { <ProjectTree /> }.into_any(),
                DrawerTab::Files => view! { <ReferenceFiles /> }.into_any(),
            }}
        </aside>
    }
}

/// Recent chats, most recently updated first.
#[component]
fn SessionList() -> impl IntoView {
    let shell = expect_context::<ChatShell>();

    view! {
        <div class="chat-sidebar__section">
            <button class="btn chat-sidebar__new" on:click=move |_| shell.new_chat()>
                "New chat"
            </button>
            {move || {
                let state = shell.view.get();
                if state.sessions.is_empty() {
                    return view! { <div class="chat-sidebar__empty">"No chats yet"</div> }.into_any();
                }
                state
                    .sessions
                    .iter()
                    .map(|session| {
                        let chat_id = session.chat_id.clone();
                        let active = is_active_chat(&state, &chat_id);
                        let label = format_chat_preview(&session.preview, NEW_CHAT_LABEL);
                        view! {
                            <button
                                class="chat-sidebar__item"
                                class:chat-sidebar__item--active=active
                                on:click=move |_| shell.open_chat(chat_id.clone())
                            >
                                {label}
                            </button>
                        }
                    })
                    .collect::<Vec<_>>()
                    .into_any()
            }}
            <button class="btn btn--subtle chat-sidebar__logout" on:click=move |_| shell.logout()>
                "Sign out"
            </button>
        </div>
    }
}

/// Projects with their conversations, plus a create field.
#[component]
fn ProjectTree() -> impl IntoView {
    let shell = expect_context::<ChatShell>();
    let ui = expect_context::<RwSignal<ChatUiState>>();

    let on_create = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let name = ui.with_untracked(|u| u.project_draft.trim().to_owned());
        if name.is_empty() {
            return;
        }
        shell.create_project(name);
        ui.update(|u| u.project_draft.clear());
    };

    view! {
        <div class="chat-sidebar__section">
            <form class="chat-sidebar__create" on:submit=on_create>
                <input
                    class="chat-sidebar__input"
                    type="text"
                    placeholder="New project name"
                    prop:value=move || ui.with(|u| u.project_draft.clone())
                    on:input=move |ev| ui.update(|u| u.project_draft = event_target_value(&ev))
                />
                <button class="btn btn--primary" type="submit">"Create"</button>
            </form>
            {move || {
                let state = shell.view.get();
                if state.projects.is_empty() {
                    return view! { <div class="chat-sidebar__empty">"No projects yet"</div> }.into_any();
                }
                state
                    .projects
                    .iter()
                    .map(|project| {
                        let expanded = state.expanded_projects.contains(&project.id);
                        let active = state.active_project_id.as_ref() == Some(&project.id);
                        project_node(shell, project, expanded, active, state.active_conversation_id)
                    })
                    .collect::<Vec<_>>()
                    .into_any()
            }}
        </div>
    }
}

fn project_node(
    shell: ChatShell,
    project: &Project,
    expanded: bool,
    active: bool,
    active_conversation: Option<i64>,
) -> impl IntoView {
    let toggle_id = project.id.clone();
    let delete_id = project.id.clone();
    let conversations = if expanded {
        project
            .conversations
            .iter()
            .map(|conversation| {
                let project_id = project.id.clone();
                let conversation_id = conversation.id;
                let label = conversation_label(conversation);
                view! {
                    <button
                        class="chat-sidebar__conversation"
                        class:chat-sidebar__conversation--active=active_conversation == Some(conversation_id)
                        on:click=move |_| shell.open_conversation(project_id.clone(), conversation_id)
                    >
                        {label}
                    </button>
                }
            })
            .collect::<Vec<_>>()
    } else {
        Vec::new()
    };

    view! {
        <div class="chat-sidebar__project" class:chat-sidebar__project--active=active>
            <div class="chat-sidebar__project-row">
                <button class="chat-sidebar__toggle" on:click=move |_| shell.toggle_project(&toggle_id)>
                    {if expanded { "▾" } else { "▸" }}
                </button>
                <span class="chat-sidebar__project-name">{project.name.clone()}</span>
                <button
                    class="chat-sidebar__delete"
                    title="Delete project"
                    on:click=move |_| shell.delete_project(delete_id.clone())
                >
                    "🗑"
                </button>
            </div>
            {conversations}
        </div>
    }
}
