//! Session & chat registry.
//!
//! SYSTEM CONTEXT
//! ==============
//! Single source of truth for the active chat, the sidebar session list, the
//! project tree and the context selections. The router and the shells hold
//! clones of one [`Registry`]; every clone shares the same state.
//!
//! DESIGN
//! ======
//! State lives in `Rc<RefCell<_>>` and is only borrowed inside synchronous
//! sections, never across an `.await`. Local appends are optimistic: they land
//! in memory first and persistence failures never roll them back. Server
//! fetches replace local state wholesale. An optional observer runs after
//! every mutation so a reactive shell can re-render.
//!
//! ERROR HANDLING
//! ==============
//! Network failures are logged with `warn!` and leave prior state intact.
//! Operations a user triggers directly return the [`ChatError`] so the shell
//! can surface it; background refreshes swallow it after logging.

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::api::PortalApi;
use crate::clock::{now_ms, parse_timestamp_ms};
use crate::config::PortalConfig;
use crate::error::ChatError;
use crate::preview::{NEW_CHAT_LABEL, format_chat_preview};
use crate::store::{KNOWLEDGE_BASE_KEY, KeyValueStore, PLAYBOOK_KEY, load_ids, save_ids};
use crate::transcript::Transcript;
use crate::types::{
    ChatId, ChatMessage, ContextSource, FileId, Project, ProjectId, ProjectLink, Role,
    SessionSummary, User,
};

/// Callback run after every state change.
pub type Observer = Rc<dyn Fn()>;

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryState {
    pub user: Option<User>,
    pub active_chat_id: Option<ChatId>,
    /// Conversation timeline in append order.
    pub messages: Vec<ChatMessage>,
    /// Preview text of the active chat, raw (not yet truncated).
    pub preview: String,
    /// Last activity of the active chat in epoch milliseconds.
    pub updated_at_ms: Option<i64>,
    /// Sidebar list, most recently updated first.
    pub sessions: Vec<SessionSummary>,
    pub projects: Vec<Project>,
    pub expanded_projects: BTreeSet<ProjectId>,
    pub active_project_id: Option<ProjectId>,
    pub active_conversation_id: Option<i64>,
    /// Project the loaded chat belongs to.
    pub current_project: Option<ProjectLink>,
    /// Files uploaded in this conversation, oldest first.
    pub uploaded_files: Vec<FileId>,
    pub playbook: Vec<FileId>,
    /// Files marked for the project knowledge base.
    pub knowledge_base: BTreeSet<FileId>,
    pub typing: bool,
    pub loading_history: bool,
}

impl RegistryState {
    /// Active context by fixed precedence.
    #[must_use]
    pub fn context_source(&self) -> ContextSource {
        ContextSource::resolve(&self.uploaded_files, &self.playbook)
    }

    /// Sidebar label: first non-empty user message, then the stored preview.
    #[must_use]
    pub fn current_chat_label(&self) -> String {
        let source = self
            .messages
            .iter()
            .find(|m| m.role == Role::User && !m.text.trim().is_empty())
            .map_or(self.preview.as_str(), |m| m.text.as_str());
        format_chat_preview(source, NEW_CHAT_LABEL)
    }

    fn replace_conversation_previews(&mut self, chat_id: &ChatId, preview: &str) {
        for project in &mut self.projects {
            for conversation in &mut project.conversations {
                if &conversation.chat_id == chat_id {
                    preview.clone_into(&mut conversation.preview);
                }
            }
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Clone)]
pub struct Registry {
    state: Rc<RefCell<RegistryState>>,
    api: Rc<dyn PortalApi>,
    store: Rc<dyn KeyValueStore>,
    config: Rc<PortalConfig>,
    observer: Rc<RefCell<Option<Observer>>>,
}

impl Registry {
    /// Build a registry, restoring playbook ids and knowledge-base marks
    /// from `store`.
    #[must_use]
    pub fn new(api: Rc<dyn PortalApi>, store: Rc<dyn KeyValueStore>, config: PortalConfig) -> Self {
        let state = RegistryState {
            playbook: load_ids(store.as_ref(), PLAYBOOK_KEY),
            knowledge_base: load_ids(store.as_ref(), KNOWLEDGE_BASE_KEY).into_iter().collect(),
            ..RegistryState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            api,
            store,
            config: Rc::new(config),
            observer: Rc::new(RefCell::new(None)),
        }
    }

    pub fn set_observer(&self, observer: impl Fn() + 'static) {
        *self.observer.borrow_mut() = Some(Rc::new(observer));
    }

    #[must_use]
    pub fn api(&self) -> Rc<dyn PortalApi> {
        Rc::clone(&self.api)
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Copy of the full state.
    #[must_use]
    pub fn snapshot(&self) -> RegistryState {
        self.state.borrow().clone()
    }

    /// Read state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&RegistryState) -> R) -> R {
        f(&self.state.borrow())
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut RegistryState) -> R) -> R {
        let out = f(&mut self.state.borrow_mut());
        self.notify();
        out
    }

    fn notify(&self) {
        let observer = self.observer.borrow().clone();
        if let Some(observer) = observer {
            observer();
        }
    }

    // --- Identity ---

    #[must_use]
    pub fn user_email(&self) -> Option<String> {
        self.with_state(|s| s.user.as_ref().map(|u| u.email.clone()))
    }

    #[must_use]
    pub fn active_chat_id(&self) -> Option<ChatId> {
        self.with_state(|s| s.active_chat_id.clone())
    }

    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.with_state(|s| s.messages.clone())
    }

    #[must_use]
    pub fn current_chat_label(&self) -> String {
        self.with_state(RegistryState::current_chat_label)
    }

    #[must_use]
    pub fn context_source(&self) -> ContextSource {
        self.with_state(RegistryState::context_source)
    }

    /// Current chat id, generating one if none exists. Idempotent.
    pub fn ensure_active_chat(&self) -> ChatId {
        if let Some(id) = self.active_chat_id() {
            return id;
        }
        let id = ChatId::generate();
        debug!(chat_id = %id, "allocated chat id");
        self.mutate(|s| s.active_chat_id = Some(id.clone()));
        id
    }

    /// Sign in: record the user, sync context selections, create the remote
    /// record for the initial chat and load the sidebar.
    pub async fn init(&self, user: User) {
        let email = user.email.clone();
        info!(%email, "registry init");
        self.mutate(|s| s.user = Some(user));

        match self.api.knowledge_base(&email).await {
            Ok(ids) => self.replace_knowledge_base(ids.into_iter().collect()),
            Err(e) => warn!(error = %e, "knowledge base fetch failed; keeping stored selection"),
        }

        let needs_playbook = self.with_state(|s| s.playbook.is_empty() && s.uploaded_files.is_empty());
        if needs_playbook {
            match self.api.list_reference_files(false).await {
                Ok(files) => {
                    let ids: Vec<FileId> = files.iter().filter(|f| f.is_active).map(|f| f.id).collect();
                    if ids.is_empty() {
                        debug!("no active reference files for default playbook");
                    } else {
                        info!(count = ids.len(), "default playbook initialized");
                        self.set_playbook(ids);
                    }
                }
                Err(e) => warn!(error = %e, "default playbook init failed"),
            }
        }

        let chat_id = self.ensure_active_chat();
        if let Err(e) = self.api.create_chat(&chat_id, &email).await {
            warn!(%chat_id, error = %e, "chat record create failed");
        }
        self.refresh_sessions().await;
        self.refresh_projects().await;
    }

    /// Look up the cookie session and sign in with it.
    ///
    /// # Errors
    ///
    /// Returns the session service error.
    pub async fn restore_session(&self) -> Result<Option<User>, ChatError> {
        let Some(session) = self.api.current_session().await? else {
            return Ok(None);
        };
        let user = session.user.clone();
        self.init(session.user).await;
        Ok(Some(user))
    }

    /// Sign out and drop everything tied to the user. Context selections stay
    /// in the store for the next sign-in.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "logout request failed");
        }
        self.mutate(|s| {
            let playbook = std::mem::take(&mut s.playbook);
            let knowledge_base = std::mem::take(&mut s.knowledge_base);
            *s = RegistryState { playbook, knowledge_base, ..RegistryState::default() };
        });
    }

    // --- Messages ---

    /// Append to the timeline synchronously. Returns the stored message.
    pub fn push_local(&self, role: Role, text: impl Into<String>) -> ChatMessage {
        let message = ChatMessage { text: text.into(), role, timestamp: now_ms() };
        self.mutate(|s| {
            s.updated_at_ms = Some(message.timestamp);
            s.messages.push(message.clone());
        });
        message
    }

    /// Use `text` as the chat preview unless one is already set.
    pub fn set_preview_if_empty(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() || self.with_state(|s| !s.preview.is_empty()) {
            return;
        }
        self.mutate(|s| text.clone_into(&mut s.preview));
    }

    /// Persist one message under `chat_id`. Failures are logged only.
    pub async fn persist_message(&self, chat_id: &ChatId, role: Role, text: &str) {
        let Some(email) = self.user_email() else {
            return;
        };
        if text.is_empty() {
            return;
        }
        if let Err(e) = self.api.save_message(chat_id, role, text, &email).await {
            warn!(%chat_id, role = role.as_str(), error = %e, "message save failed");
        }
    }

    /// Append locally, then persist under the active chat.
    pub async fn append_message(&self, role: Role, text: impl Into<String>) -> ChatMessage {
        let message = self.push_local(role, text);
        let chat_id = self.ensure_active_chat();
        self.persist_message(&chat_id, role, &message.text).await;
        message
    }

    /// Submit the paired transcript of the current messages under `chat_id`.
    pub async fn save_transcript(&self, chat_id: &ChatId) {
        let Some(email) = self.user_email() else {
            return;
        };
        let transcript = self.with_state(|s| Transcript::from_messages(&s.messages));
        if transcript.is_empty() {
            return;
        }
        let json = match transcript.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(%chat_id, error = %e, "transcript serialize failed");
                return;
            }
        };
        if let Err(e) = self.api.save_conversation(chat_id, &json, &email).await {
            warn!(%chat_id, error = %e, "transcript save failed");
        }
    }

    /// Replace the timeline and project linkage with the server's copy.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] when signed out, or the fetch error.
    /// State is untouched on error.
    pub async fn load_history(&self, chat_id: &ChatId) -> Result<(), ChatError> {
        let email = self
            .user_email()
            .ok_or_else(|| ChatError::Validation("sign in to load chat history".to_owned()))?;

        self.mutate(|s| s.loading_history = true);
        let history = match self.api.fetch_messages(chat_id, &email).await {
            Ok(history) => history,
            Err(e) => {
                warn!(%chat_id, error = %e, "history load failed");
                self.mutate(|s| s.loading_history = false);
                return Err(e);
            }
        };

        let messages: Vec<ChatMessage> = history
            .messages
            .iter()
            .map(|m| ChatMessage {
                text: match m.role {
                    Role::Assistant => markup::strip_code_fences(&m.message),
                    Role::User => m.message.clone(),
                },
                role: m.role,
                timestamp: m.created_at.as_deref().and_then(parse_timestamp_ms).unwrap_or(0),
            })
            .collect();
        let preview = history
            .messages
            .iter()
            .find(|m| m.role == Role::User)
            .or_else(|| history.messages.first())
            .map(|m| m.message.clone())
            .unwrap_or_default();
        let updated_at = history
            .messages
            .last()
            .and_then(|m| m.created_at.as_deref())
            .and_then(parse_timestamp_ms)
            .unwrap_or_else(now_ms);

        info!(%chat_id, count = messages.len(), "history loaded");
        self.mutate(|s| {
            s.messages = messages;
            s.active_chat_id = Some(chat_id.clone());
            s.active_project_id = history.project.as_ref().map(|p| p.id.clone());
            s.current_project = history.project;
            s.updated_at_ms = Some(updated_at);
            if !preview.is_empty() {
                s.replace_conversation_previews(chat_id, &preview);
            }
            s.preview = preview;
            s.loading_history = false;
        });
        self.refresh_sessions().await;
        Ok(())
    }

    /// Flush the outgoing conversation, then switch to a fresh chat.
    pub async fn start_new_chat(&self) -> ChatId {
        let outgoing = self.with_state(|s| {
            s.active_chat_id.clone().filter(|_| !s.messages.is_empty())
        });
        if let Some(chat_id) = outgoing {
            self.save_transcript(&chat_id).await;
        }

        let chat_id = ChatId::generate();
        info!(%chat_id, "new chat");
        self.mutate(|s| {
            s.current_project = None;
            s.active_project_id = None;
            s.active_conversation_id = None;
            s.messages.clear();
            s.active_chat_id = Some(chat_id.clone());
            s.preview.clear();
            s.updated_at_ms = Some(now_ms());
        });

        if let Some(email) = self.user_email() {
            if let Err(e) = self.api.create_chat(&chat_id, &email).await {
                warn!(%chat_id, error = %e, "chat record create failed");
            }
        }
        self.refresh_sessions().await;
        chat_id
    }

    /// Adopt a server-issued chat id for a request sent under `requested`.
    ///
    /// Conversation refs pointing at the old id are rewritten. The active id
    /// only moves if it is still `requested`; a chat switch made while the
    /// request was in flight wins.
    pub fn repoint_chat(&self, requested: &ChatId, server: &ChatId) {
        if requested == server {
            return;
        }
        info!(from = %requested, to = %server, "chat id repointed by server");
        self.mutate(|s| {
            if s.active_chat_id.as_ref() == Some(requested) {
                s.active_chat_id = Some(server.clone());
            }
            for session in &mut s.sessions {
                if &session.chat_id == requested {
                    session.chat_id = server.clone();
                }
            }
            for project in &mut s.projects {
                for conversation in &mut project.conversations {
                    if &conversation.chat_id == requested {
                        conversation.chat_id = server.clone();
                    }
                }
            }
        });
    }

    pub fn set_typing(&self, typing: bool) {
        self.mutate(|s| s.typing = typing);
    }

    // --- Sidebar ---

    /// Reload the session list, most recently updated first.
    pub async fn refresh_sessions(&self) {
        let Some(email) = self.user_email() else {
            return;
        };
        let mut sessions = match self.api.list_sessions(&email).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "session list refresh failed");
                return;
            }
        };
        sort_sessions(&mut sessions);

        self.mutate(|s| {
            let active = s
                .active_chat_id
                .as_ref()
                .and_then(|id| sessions.iter().find(|session| &session.chat_id == id));
            if let Some(active) = active {
                if s.preview.is_empty() && !active.preview.is_empty() {
                    s.preview.clone_from(&active.preview);
                }
                if let Some(ms) = active.updated_at.as_deref().and_then(parse_timestamp_ms) {
                    s.updated_at_ms = Some(ms);
                }
            }
            s.sessions = sessions;
        });
    }

    /// Reload the project tree. Expands the first project with conversations
    /// when nothing is expanded yet.
    pub async fn refresh_projects(&self) {
        let Some(email) = self.user_email() else {
            return;
        };
        let projects = match self.api.list_projects(&email).await {
            Ok(projects) => projects,
            Err(e) => {
                warn!(error = %e, "project list refresh failed");
                return;
            }
        };
        self.mutate(|s| {
            if s.expanded_projects.is_empty() {
                if let Some(first) = projects.iter().find(|p| !p.conversations.is_empty()) {
                    s.expanded_projects.insert(first.id.clone());
                }
            }
            s.projects = projects;
        });
    }

    // --- Projects ---

    /// Create a project, put it at the head of the tree and open its
    /// default conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] for a blank name or when signed out,
    /// otherwise the service error.
    pub async fn create_project(&self, name: &str) -> Result<ProjectId, ChatError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::Validation("project name must not be empty".to_owned()));
        }
        let email = self
            .user_email()
            .ok_or_else(|| ChatError::Validation("sign in to create a project".to_owned()))?;

        let created = self.api.create_project(name, &email).await.inspect_err(|e| {
            warn!(name, error = %e, "project create failed");
        })?;
        let project_id = created.project.id.clone();
        let conversation = created.conversation.clone();
        info!(%project_id, chat_id = %conversation.chat_id, "project created");

        self.mutate(|s| {
            s.projects.retain(|p| p.id != project_id);
            s.projects.insert(0, created.project);
            s.expanded_projects.insert(project_id.clone());
            s.active_project_id = Some(project_id.clone());
            s.active_conversation_id = Some(conversation.id);
        });
        if let Err(e) = self.load_history(&conversation.chat_id).await {
            warn!(chat_id = %conversation.chat_id, error = %e, "new project conversation load failed");
        }
        Ok(project_id)
    }

    /// Delete a project. Deleting the active project clears the active
    /// project and conversation pointers.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] when signed out, otherwise the
    /// service error. State is untouched on error.
    pub async fn delete_project(&self, project_id: &ProjectId) -> Result<(), ChatError> {
        let email = self
            .user_email()
            .ok_or_else(|| ChatError::Validation("sign in to delete a project".to_owned()))?;
        self.api.delete_project(project_id, &email).await.inspect_err(|e| {
            warn!(%project_id, error = %e, "project delete failed");
        })?;

        info!(%project_id, "project deleted");
        self.mutate(|s| {
            if s.active_project_id.as_ref() == Some(project_id) {
                s.active_project_id = None;
                s.active_conversation_id = None;
                s.current_project = None;
            }
            s.expanded_projects.remove(project_id);
            s.projects.retain(|p| &p.id != project_id);
        });
        self.refresh_projects().await;
        Ok(())
    }

    /// Open a project's conversation.
    ///
    /// # Errors
    ///
    /// Returns the history load error; the selection is kept so the user can
    /// retry.
    pub async fn select_conversation(&self, project_id: &ProjectId, conversation_id: i64) -> Result<(), ChatError> {
        let chat_id = self.with_state(|s| {
            s.projects
                .iter()
                .find(|p| &p.id == project_id)
                .and_then(|p| p.conversations.iter().find(|c| c.id == conversation_id))
                .map(|c| c.chat_id.clone())
        });
        let Some(chat_id) = chat_id else {
            return Err(ChatError::Validation(format!(
                "conversation {conversation_id} not found in project {project_id}"
            )));
        };
        self.mutate(|s| {
            s.active_project_id = Some(project_id.clone());
            s.active_conversation_id = Some(conversation_id);
        });
        self.load_history(&chat_id).await
    }

    pub fn toggle_project_expanded(&self, project_id: &ProjectId) {
        self.mutate(|s| {
            if !s.expanded_projects.remove(project_id) {
                s.expanded_projects.insert(project_id.clone());
            }
        });
    }

    // --- Context selection ---

    /// Record freshly uploaded files. The most recent one backs questions.
    pub fn register_uploads(&self, ids: &[FileId]) {
        if ids.is_empty() {
            return;
        }
        self.mutate(|s| s.uploaded_files.extend_from_slice(ids));
    }

    pub fn clear_uploads(&self) {
        self.mutate(|s| s.uploaded_files.clear());
    }

    /// Replace the playbook and write it to the store.
    pub fn set_playbook(&self, ids: Vec<FileId>) {
        if let Err(e) = save_ids(self.store.as_ref(), PLAYBOOK_KEY, &ids) {
            warn!(error = %e, "playbook store write failed");
        }
        self.mutate(|s| s.playbook = ids);
    }

    fn replace_knowledge_base(&self, ids: BTreeSet<FileId>) {
        let list: Vec<FileId> = ids.iter().copied().collect();
        if let Err(e) = save_ids(self.store.as_ref(), KNOWLEDGE_BASE_KEY, &list) {
            warn!(error = %e, "knowledge base store write failed");
        }
        self.mutate(|s| s.knowledge_base = ids);
    }

    /// Mark or unmark a file for the project knowledge base. Returns whether
    /// the file is now marked.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] when signed out, otherwise the
    /// service error. The selection is untouched on error.
    pub async fn toggle_knowledge_base(&self, file_id: FileId) -> Result<bool, ChatError> {
        let email = self
            .user_email()
            .ok_or_else(|| ChatError::Validation("sign in to save knowledge base selections".to_owned()))?;
        let marked = self.with_state(|s| s.knowledge_base.contains(&file_id));
        let result = if marked {
            self.api.unmark_knowledge_base(file_id, &email).await
        } else {
            self.api.mark_knowledge_base(file_id, &email).await
        };
        result.inspect_err(|e| warn!(%file_id, error = %e, "knowledge base toggle failed"))?;

        let mut next = self.with_state(|s| s.knowledge_base.clone());
        if marked {
            next.remove(&file_id);
        } else {
            next.insert(file_id);
        }
        self.replace_knowledge_base(next);
        Ok(!marked)
    }

    /// Delete a reference file and drop it from the knowledge base.
    ///
    /// # Errors
    ///
    /// Returns the service error; nothing changes locally on error.
    pub async fn delete_reference_file(&self, file_id: FileId) -> Result<(), ChatError> {
        self.api
            .delete_reference_file(file_id)
            .await
            .inspect_err(|e| warn!(%file_id, error = %e, "reference file delete failed"))?;
        let mut next = self.with_state(|s| s.knowledge_base.clone());
        if next.remove(&file_id) {
            self.replace_knowledge_base(next);
        }
        Ok(())
    }
}

/// Most recent first by parsed timestamp; entries without one go last.
/// Ties keep fetch order.
pub fn sort_sessions(sessions: &mut [SessionSummary]) {
    sessions.sort_by_key(|s| {
        std::cmp::Reverse(s.updated_at.as_deref().and_then(parse_timestamp_ms).unwrap_or(i64::MIN))
    });
}
