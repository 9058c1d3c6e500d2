//! Browser shell for the portal's floating chat assistant.
//!
//! SYSTEM CONTEXT
//! ==============
//! Composition root: wires DOM input events to the `chat` router and the
//! `panel` controller, and renders registry state reactively. Everything with
//! real behavior lives in those crates; this crate only binds it to the page.
//!
//! ARCHITECTURE
//! ============
//! | Module | Role |
//! |--------|------|
//! | [`app`] | Root component, context providers, session bootstrap |
//! | [`components`] | Panel frame, sidebar, timeline, composer, file list |
//! | [`state`] | Reactive handles over the engine and local UI chrome |
//! | [`util`] | Browser glue: storage, pointer capture, file IO, styles |

pub mod app;
pub mod components;
pub mod state;
pub mod util;

#[cfg(feature = "ssr")]
pub use app::shell;

/// WASM entry point: install panic/log hooks and hydrate the server-rendered
/// shell.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    leptos::mount::hydrate_body(app::App);
}
