//! Chat engine for the portal's floating assistant panel.
//!
//! SYSTEM CONTEXT
//! ==============
//! Browser and terminal shells drive the same engine: a [`Registry`] holding
//! chat, project and context state, and a [`Router`] that dispatches
//! questions and uploads. Both talk to the portal through the
//! [`api::PortalApi`] seam; [`api::http::PortalClient`] is the production
//! implementation.
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Domain identifiers, messages, projects, files |
//! | [`api`] | Service traits, wire envelopes, `reqwest` client |
//! | [`registry`] | Active chat, sidebar, project tree, context selection |
//! | [`router`] | Question dispatch, uploads, playbook bootstrap |
//! | [`store`] | Key-value backup of context selections |
//! | [`transcript`] | Paired transcript for flushed chats |
//! | [`context`] | Inline document context assembly |
//! | [`preview`] | Sidebar labels and local fallback replies |
//! | [`config`] | Environment-driven settings |
//! | [`error`] | Error taxonomy |

pub mod api;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod preview;
pub mod registry;
pub mod router;
pub mod store;
pub mod transcript;
pub mod types;

#[cfg(test)]
mod test_helpers;

pub use config::PortalConfig;
pub use error::{ChatError, ConfigError, ErrorCode};
pub use registry::{Registry, RegistryState};
pub use router::Router;
pub use store::{KeyValueStore, MemoryStore};
