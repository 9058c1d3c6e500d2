//! Browser glue shared across client components.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser/environment concerns from component logic.
//! Everything touching `web_sys` is gated on `hydrate` and degrades to a no-op
//! during server rendering.

pub mod file_io;
pub mod local_store;
pub mod panel_layout;
#[cfg(feature = "hydrate")]
pub mod pointer;
