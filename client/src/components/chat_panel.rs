//! Floating panel frame: header, drawer, timeline and resize handles.
//!
//! ARCHITECTURE
//! ============
//! The `panel` crate owns all geometry. This component forwards pointer-down
//! on the header or a corner handle to `PanelController`, then applies the
//! returned actions: window listeners are attached on `CaptureGlobalPointer`
//! and detached on `ReleaseGlobalPointer`, so move/up handling exists only
//! while a gesture runs.

use leptos::prelude::*;
use panel::{DisplayMode, PanelController, PointerTarget, ResizeHandle};

use crate::components::chat_sidebar::ChatSidebar;
use crate::components::composer::Composer;
use crate::components::message_list::MessageList;
use crate::state::chat::{ChatShell, context_label};
use crate::state::ui::{ChatUiState, DrawerTab};
use crate::util::panel_layout::{current_viewport, panel_style};

#[cfg(feature = "hydrate")]
use crate::util::pointer::{CaptureSlot, GlobalPointer, capture, release, set_document_cursor};
#[cfg(feature = "hydrate")]
use panel::{Action, Point, Rect};

#[cfg(feature = "hydrate")]
fn pointer_point(ev: &web_sys::PointerEvent) -> Point {
    Point::new(f64::from(ev.client_x()), f64::from(ev.client_y()))
}

/// Apply controller side effects. Geometry changes need no work here: the
/// controller signal itself drives the re-render.
#[cfg(feature = "hydrate")]
fn apply_actions(actions: Vec<Action>, controller: RwSignal<PanelController>, slot: CaptureSlot) {
    for action in actions {
        match action {
            Action::CaptureGlobalPointer => {
                let pointer = GlobalPointer::install(
                    move |ev| {
                        let point = pointer_point(&ev);
                        let next = controller.try_update(|c| c.on_pointer_move(point)).unwrap_or_default();
                        apply_actions(next, controller, slot);
                    },
                    move |_| {
                        let next = controller.try_update(PanelController::on_pointer_up).unwrap_or_default();
                        apply_actions(next, controller, slot);
                    },
                );
                capture(slot, pointer);
            }
            Action::ReleaseGlobalPointer => release(slot),
            Action::SetCursor(cursor) => set_document_cursor(&cursor),
            Action::GeometryChanged(_) | Action::DockChanged(_) => {}
        }
    }
}

/// Floating chat panel with its launcher button.
#[component]
pub fn ChatPanel() -> impl IntoView {
    let shell = expect_context::<ChatShell>();
    let ui = expect_context::<RwSignal<ChatUiState>>();

    let controller = RwSignal::new(PanelController::new(current_viewport()));
    let panel_ref = NodeRef::<leptos::html::Div>::new();
    #[cfg(feature = "hydrate")]
    let slot: CaptureSlot = StoredValue::new_local(None);

    #[cfg(feature = "hydrate")]
    {
        let handle = window_event_listener(leptos::ev::resize, move |_| {
            let next = controller.try_update(|c| c.set_viewport(current_viewport())).unwrap_or_default();
            apply_actions(next, controller, slot);
        });
        on_cleanup(move || handle.remove());
        on_cleanup(move || release(slot));
    }

    let begin_gesture = move |ev: leptos::ev::PointerEvent, target: PointerTarget| {
        #[cfg(feature = "hydrate")]
        {
            let Some(el) = panel_ref.get_untracked() else {
                return;
            };
            let bounds = el.get_bounding_client_rect();
            let rect = Rect::new(bounds.left(), bounds.top(), bounds.width(), bounds.height());
            let point = pointer_point(&ev);
            let actions = controller.try_update(|c| c.on_pointer_down(target, point, rect)).unwrap_or_default();
            if !actions.is_empty() {
                ev.prevent_default();
            }
            apply_actions(actions, controller, slot);
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (ev, target, panel_ref);
        }
    };

    let toggle_fullscreen = move |_| {
        let next_mode = if controller.with_untracked(|c| c.geometry().is_fullscreen()) {
            DisplayMode::Floating
        } else {
            DisplayMode::Fullscreen
        };
        let actions = controller.try_update(|c| c.set_display_mode(next_mode)).unwrap_or_default();
        #[cfg(feature = "hydrate")]
        apply_actions(actions, controller, slot);
        #[cfg(not(feature = "hydrate"))]
        let _ = actions;
    };

    let is_fullscreen = move || controller.with(|c| c.geometry().is_fullscreen());
    let is_docked = move || controller.with(|c| c.geometry().docked_top_left);
    let style = move || controller.with(|c| panel_style(c.geometry()));
    let title = move || shell.view.with(chat::RegistryState::current_chat_label);
    let context = move || shell.view.with(|s| context_label(&s.context_source()));
    let project = move || shell.view.with(|s| s.current_project.as_ref().map(|p| p.name.clone()));
    let tab_button = move |tab: DrawerTab, label: &'static str| {
        let active = move || ui.with(|u| u.drawer_open && u.drawer_tab == tab);
        view! {
            <button
                class="chat-panel__tab"
                class:chat-panel__tab--active=active
                on:pointerdown=|ev| ev.stop_propagation()
                on:click=move |_| ui.update(|u| u.select_tab(tab))
            >
                {label}
            </button>
        }
    };

    view! {
        <button class="chat-launcher" title="Project assistant" on:click=move |_| ui.update(ChatUiState::toggle_open)>
            "💬"
        </button>
        <Show when=move || ui.with(|u| u.open)>
            <div
                class="chat-panel"
                class:chat-panel--docked=is_docked
                class:chat-panel--fullscreen=is_fullscreen
                style=style
                node_ref=panel_ref
            >
                <div class="chat-panel__header" on:pointerdown=move |ev| begin_gesture(ev, PointerTarget::Header)>
                    {tab_button(DrawerTab::Chats, "Chats")}
                    {tab_button(DrawerTab::Projects, "Projects")}
                    {tab_button(DrawerTab::Files, "Files")}
                    <div class="chat-panel__title">
                        <span>{title}</span>
                        {move || project().map(|name| view! { <span class="chat-panel__project">{name}</span> })}
                    </div>
                    <button
                        class="chat-panel__action"
                        title="New chat"
                        on:pointerdown=|ev| ev.stop_propagation()
                        on:click=move |_| shell.new_chat()
                    >
                        "＋"
                    </button>
                    <button
                        class="chat-panel__action"
                        title="Toggle fullscreen"
                        on:pointerdown=|ev| ev.stop_propagation()
                        on:click=toggle_fullscreen
                    >
                        {move || if is_fullscreen() { "🗗" } else { "🗖" }}
                    </button>
                    <button
                        class="chat-panel__action"
                        title="Close"
                        on:pointerdown=|ev| ev.stop_propagation()
                        on:click=move |_| ui.update(ChatUiState::toggle_open)
                    >
                        "✕"
                    </button>
                </div>
                <div class="chat-panel__body">
                    <Show when=move || ui.with(|u| u.drawer_open)>
                        <ChatSidebar />
                    </Show>
                    <div class="chat-panel__main">
                        <div class="chat-panel__context">{context}</div>
                        <MessageList />
                        <Composer />
                    </div>
                </div>
                <Show when=move || !is_fullscreen()>
                    {ResizeHandle::ALL
                        .into_iter()
                        .map(move |handle| {
                            view! {
                                <div
                                    class=format!("chat-panel__handle chat-panel__handle--{}", handle.class_suffix())
                                    style=format!("cursor: {};", handle.cursor())
                                    on:pointerdown=move |ev| begin_gesture(ev, PointerTarget::Handle(handle))
                                ></div>
                            }
                        })
                        .collect::<Vec<_>>()}
                </Show>
            </div>
        </Show>
    }
}
