//! Reactive handle over the chat engine.
//!
//! SYSTEM CONTEXT
//! ==============
//! The engine (`Registry` + `Router`) is single-threaded and `Rc`-based, so it
//! lives in a local `StoredValue`. Its observer copies every state change into
//! an `RwSignal<RegistryState>` that components read like any other signal.
//!
//! DESIGN
//! ======
//! Every user action clones the router out of storage and runs on
//! `spawn_local`; nothing holds a storage borrow across an await. Failures are
//! logged here and otherwise surface through the timeline the engine appends.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use chat::api::FileApi;
use chat::registry::RegistryState;
use chat::types::{ChatId, ContextSource, FileId, ProjectId, ReferenceFile, UploadFile};
use chat::{Registry, Router};
use leptos::logging::warn;
use leptos::prelude::*;

/// Where the cookie session lookup stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthPhase {
    #[default]
    Loading,
    SignedIn,
    SignedOut,
}

#[derive(Clone, Copy)]
pub struct ChatShell {
    router: StoredValue<Router, LocalStorage>,
    /// Mirror of the registry, refreshed after every mutation.
    pub view: RwSignal<RegistryState>,
    pub auth: RwSignal<AuthPhase>,
    /// Reference files for the file drawer, without extracted text.
    pub files: RwSignal<Vec<ReferenceFile>>,
    /// Names of files waiting in the upload batch.
    pub pending: RwSignal<Vec<String>>,
}

impl ChatShell {
    pub fn new(router: Router) -> Self {
        let view = RwSignal::new(router.registry().snapshot());
        let stored = StoredValue::new_local(router);
        stored.with_value(|router| {
            router.registry().set_observer(move || {
                if let Some(state) = stored.try_with_value(|r| r.registry().snapshot()) {
                    view.set(state);
                }
            });
        });
        Self {
            router: stored,
            view,
            auth: RwSignal::new(AuthPhase::Loading),
            files: RwSignal::new(Vec::new()),
            pending: RwSignal::new(Vec::new()),
        }
    }

    fn engine(&self) -> Router {
        self.router.get_value()
    }

    fn registry(&self) -> Registry {
        self.engine().registry().clone()
    }

    fn sync_pending(&self, router: &Router) {
        self.pending.set(router.pending_names());
    }

    // --- Session ---

    pub fn restore_session(&self) {
        let this = *self;
        let registry = self.registry();
        leptos::task::spawn_local(async move {
            match registry.restore_session().await {
                Ok(Some(_)) => {
                    this.auth.set(AuthPhase::SignedIn);
                    this.refresh_files();
                }
                Ok(None) => this.auth.set(AuthPhase::SignedOut),
                Err(e) => {
                    warn!("session lookup failed: {e}");
                    this.auth.set(AuthPhase::SignedOut);
                }
            }
        });
    }

    pub fn logout(&self) {
        let this = *self;
        let registry = self.registry();
        leptos::task::spawn_local(async move {
            registry.logout().await;
            this.files.set(Vec::new());
            this.auth.set(AuthPhase::SignedOut);
        });
    }

    // --- Conversation ---

    pub fn ask(&self, question: String) {
        let router = self.engine();
        leptos::task::spawn_local(async move {
            router.ask(&question).await;
        });
    }

    pub fn start_project(&self) {
        let router = self.engine();
        leptos::task::spawn_local(async move {
            router.start_project().await;
        });
    }

    pub fn new_chat(&self) {
        let registry = self.registry();
        leptos::task::spawn_local(async move {
            registry.start_new_chat().await;
        });
    }

    pub fn open_chat(&self, chat_id: ChatId) {
        let registry = self.registry();
        leptos::task::spawn_local(async move {
            if let Err(e) = registry.load_history(&chat_id).await {
                warn!("history load failed for {chat_id}: {e}");
            }
        });
    }

    // --- Uploads ---

    /// Add files to the upload batch; over-limit batches are rejected with a
    /// timeline message.
    pub fn select_files(&self, files: Vec<UploadFile>) {
        let router = self.engine();
        if let Err(e) = router.select_files(files) {
            warn!("file selection rejected: {e}");
        }
        self.sync_pending(&router);
    }

    pub fn remove_pending(&self, index: usize) {
        let router = self.engine();
        router.remove_selected(index);
        self.sync_pending(&router);
    }

    pub fn upload(&self) {
        let this = *self;
        let router = self.engine();
        leptos::task::spawn_local(async move {
            router.upload_selected().await;
            this.sync_pending(&router);
        });
    }

    // --- Projects ---

    pub fn create_project(&self, name: String) {
        let registry = self.registry();
        leptos::task::spawn_local(async move {
            if let Err(e) = registry.create_project(&name).await {
                warn!("project create failed: {e}");
            }
        });
    }

    pub fn delete_project(&self, project_id: ProjectId) {
        let registry = self.registry();
        leptos::task::spawn_local(async move {
            if let Err(e) = registry.delete_project(&project_id).await {
                warn!("project delete failed: {e}");
            }
        });
    }

    pub fn open_conversation(&self, project_id: ProjectId, conversation_id: i64) {
        let registry = self.registry();
        leptos::task::spawn_local(async move {
            if let Err(e) = registry.select_conversation(&project_id, conversation_id).await {
                warn!("conversation load failed: {e}");
            }
        });
    }

    pub fn toggle_project(&self, project_id: &ProjectId) {
        self.registry().toggle_project_expanded(project_id);
    }

    // --- Reference files ---

    pub fn refresh_files(&self) {
        let this = *self;
        let registry = self.registry();
        leptos::task::spawn_local(async move {
            match registry.api().list_reference_files(false).await {
                Ok(files) => this.files.set(files),
                Err(e) => warn!("reference file list failed: {e}"),
            }
        });
    }

    pub fn toggle_knowledge_base(&self, file_id: FileId) {
        let registry = self.registry();
        leptos::task::spawn_local(async move {
            if let Err(e) = registry.toggle_knowledge_base(file_id).await {
                warn!("knowledge base toggle failed for {file_id}: {e}");
            }
        });
    }

    pub fn delete_file(&self, file_id: FileId) {
        let this = *self;
        let registry = self.registry();
        leptos::task::spawn_local(async move {
            match registry.delete_reference_file(file_id).await {
                Ok(()) => this.files.update(|files| files.retain(|f| f.id != file_id)),
                Err(e) => warn!("reference file delete failed for {file_id}: {e}"),
            }
        });
    }

    pub fn download_file(&self, file_id: FileId, file_name: String) {
        let registry = self.registry();
        leptos::task::spawn_local(async move {
            match registry.api().download_reference_file(file_id).await {
                Ok(bytes) => crate::util::file_io::save_bytes(&file_name, &bytes),
                Err(e) => warn!("download failed for {file_id}: {e}"),
            }
        });
    }
}

/// Banner text naming the context the next question will use.
pub fn context_label(source: &ContextSource) -> String {
    match source {
        ContextSource::UploadedFiles(_) => "Answering from your uploaded file".to_owned(),
        ContextSource::Playbook(ids) => format!("Answering from the project playbook ({} files)", ids.len()),
        ContextSource::None => "Answering from the general knowledge base".to_owned(),
    }
}

/// Whether `chat_id` is the chat on screen.
pub fn is_active_chat(state: &RegistryState, chat_id: &ChatId) -> bool {
    state.active_chat_id.as_ref() == Some(chat_id)
}
