//! Reactive state shared through Leptos context.
//!
//! DESIGN
//! ======
//! `chat` holds the handle over the engine and its mirrored snapshot; `ui`
//! holds presentation toggles that the engine never sees.

pub mod chat;
pub mod ui;
