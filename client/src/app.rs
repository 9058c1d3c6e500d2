//! Root component and context wiring.
//!
//! SYSTEM CONTEXT
//! ==============
//! Builds one engine per page (registry over the HTTP client and a
//! `localStorage` store, router over the registry), publishes reactive
//! handles through Leptos context, and restores the cookie session on
//! hydration.

use std::rc::Rc;

use chat::api::PortalApi;
use chat::api::http::PortalClient;
use chat::{PortalConfig, Registry, Router};
use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};

use crate::components::chat_panel::ChatPanel;
use crate::state::chat::{AuthPhase, ChatShell};
use crate::state::ui::ChatUiState;
use crate::util::local_store::LocalStore;

/// HTML document shell for server rendering.
#[cfg(feature = "ssr")]
pub fn shell(options: LeptosOptions) -> impl IntoView {
    use leptos_meta::MetaTags;

    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <AutoReload options=options.clone() />
                <HydrationScripts options />
                <MetaTags />
            </head>
            <body>
                <App />
            </body>
        </html>
    }
}

/// Backend settings for this page: same origin as the document in the
/// browser, defaults elsewhere.
fn page_config() -> PortalConfig {
    #[cfg(feature = "hydrate")]
    {
        let origin = web_sys::window().and_then(|w| w.location().origin().ok());
        if let Some(origin) = origin {
            if let Ok(config) = PortalConfig::default().with_base_url(&origin) {
                return config;
            }
        }
    }
    PortalConfig::default()
}

/// Build the engine, or `None` when the HTTP client cannot be created.
fn build_router() -> Option<Router> {
    let config = page_config();
    let client = match PortalClient::new(config.clone()) {
        Ok(client) => client,
        Err(e) => {
            leptos::logging::error!("portal client init failed: {e}");
            return None;
        }
    };
    let api: Rc<dyn PortalApi> = Rc::new(client);
    let registry = Registry::new(api, Rc::new(LocalStore), config);
    Some(Router::new(registry))
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let ui = RwSignal::new(ChatUiState::default());
    provide_context(ui);

    let engine = build_router().map(ChatShell::new);
    if let Some(engine) = engine {
        provide_context(engine);
        // Effects only run in the browser; the session lives in its cookie.
        Effect::new(move |_| engine.restore_session());
    }

    view! {
        <Title text="Project Assistant" />
        {move || match engine {
            Some(engine) => {
                let signed_out = move || engine.auth.get() == AuthPhase::SignedOut;
                view! {
                    <Show when=signed_out>
                        <div class="chat-signin">
                            <a href="/login" class="btn btn--primary">"Sign in to use the assistant"</a>
                        </div>
                    </Show>
                    <ChatPanel />
                }
                    .into_any()
            }
            None => view! { <div class="chat-unavailable">"Assistant unavailable"</div> }.into_any(),
        }}
    }
}
