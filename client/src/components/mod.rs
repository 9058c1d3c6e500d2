//! Chat panel component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render the floating panel and its surfaces while reading the
//! `ChatShell` and `ChatUiState` handles from Leptos context.

pub mod chat_panel;
pub mod chat_sidebar;
pub mod composer;
pub mod message_list;
pub mod reference_files;
