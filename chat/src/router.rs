//! Message dispatch router.
//!
//! SYSTEM CONTEXT
//! ==============
//! Entry point for everything the user sends: questions, file uploads and
//! the playbook bootstrap. Reads context selections from the [`Registry`],
//! calls the question endpoint, runs replies through `markup::render` and
//! appends the result.
//!
//! DESIGN
//! ======
//! `ask` appends the user message before any request goes out and appends
//! exactly one assistant message after the response resolves. Every error on
//! that path becomes the assistant message; nothing propagates. The typing
//! flag is raised by a guard whose `Drop` clears it, so every exit path
//! clears it. Each call snapshots the chat id up front and persists under
//! that snapshot even if the user switches chats meanwhile.

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{info, warn};

use crate::context::{combine_documents, has_enough_content, select_documents};
use crate::error::{ChatError, ErrorCode};
use crate::preview::canned_reply;
use crate::registry::Registry;
use crate::types::{
    AskContext, AskReply, AskRequest, ChatId, ChatMessage, ContextSource, FileId, Role, UploadFile,
};

/// Reply when a non-fallback source fails without explanation.
pub const GENERIC_ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

const PLAYBOOK_EMPTY: &str = "Playbook files not found or have no content";
const NO_MANDATORY_FILES: &str =
    "⚠️ No mandatory files available. Please upload at least one file in the Mandatory Files section.";
const NO_FILE_CONTENT: &str = "⚠️ No valid file content found in marked files. Please ensure files have been processed and contain extracted text.";
const THIN_FILE_CONTENT: &str = "⚠️ The selected files have very little extracted content. Please ensure files have been properly processed. You may need to re-upload the files.";

// =============================================================================
// TYPING GUARD
// =============================================================================

/// Raises the typing flag; clears it when dropped.
struct TypingGuard<'a> {
    registry: &'a Registry,
}

impl<'a> TypingGuard<'a> {
    fn raise(registry: &'a Registry) -> Self {
        registry.set_typing(true);
        Self { registry }
    }
}

impl Drop for TypingGuard<'_> {
    fn drop(&mut self) {
        self.registry.set_typing(false);
    }
}

// =============================================================================
// ROUTER
// =============================================================================

#[derive(Clone)]
pub struct Router {
    registry: Registry,
    pending: Rc<RefCell<Vec<UploadFile>>>,
}

impl Router {
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self { registry, pending: Rc::new(RefCell::new(Vec::new())) }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // --- Questions ---

    /// Send a question and append the assistant's answer or a formatted
    /// error. Returns the appended assistant message. Blank questions are
    /// ignored and return `None`.
    pub async fn ask(&self, question: &str) -> Option<ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.registry.push_local(Role::User, question);
        self.registry.set_preview_if_empty(question);
        let guard = TypingGuard::raise(&self.registry);
        let chat_id = self.registry.ensure_active_chat();
        let source = self.registry.context_source();
        info!(%chat_id, source = source_label(&source), "ask");

        let (_, outcome) = futures::join!(
            self.registry.persist_message(&chat_id, Role::User, question),
            self.dispatch(question, &chat_id, &source),
        );

        let mut answered = false;
        let mut owner = chat_id.clone();
        let reply_text = match outcome {
            Ok(reply) => {
                if let Some(server_id) = &reply.chat_id {
                    self.registry.repoint_chat(&chat_id, server_id);
                    owner = server_id.clone();
                }
                match reply.answer() {
                    Some(answer) => {
                        answered = true;
                        markup::render(answer)
                    }
                    None => failure_text(question, &source, &reply),
                }
            }
            Err(e) => {
                warn!(%chat_id, error = %e, code = e.error_code(), "ask failed");
                format!("Sorry, there was an error: {e}. Please try again.")
            }
        };

        // The timeline still belongs to this ask's chat only if no switch
        // happened while the request was in flight.
        let still_active = self.registry.active_chat_id().as_ref() == Some(&owner);
        let message = self.registry.push_local(Role::Assistant, reply_text);
        self.registry.persist_message(&chat_id, Role::Assistant, &message.text).await;
        if answered && still_active {
            self.registry.save_transcript(&owner).await;
        } else if answered {
            info!(%chat_id, "chat switched during ask; transcript skipped");
        }
        drop(guard);
        self.registry.refresh_sessions().await;
        Some(message)
    }

    /// Build and send the request for the resolved source.
    async fn dispatch(&self, question: &str, chat_id: &ChatId, source: &ContextSource) -> Result<AskReply, ChatError> {
        let context = match source {
            ContextSource::UploadedFiles(ids) => match ids.last() {
                Some(id) => AskContext::File(*id),
                None => AskContext::None,
            },
            ContextSource::Playbook(ids) => self.inline_context(ids, PLAYBOOK_EMPTY).await?,
            ContextSource::None => AskContext::None,
        };
        let request = AskRequest {
            question: question.to_owned(),
            chat_id: chat_id.clone(),
            user_email: self.registry.user_email(),
            context,
        };
        self.registry.api().ask(&request).await
    }

    /// Fetch reference files and combine the text of those in `ids`.
    async fn inline_context(&self, ids: &[FileId], empty_message: &str) -> Result<AskContext, ChatError> {
        let files = self.registry.api().list_reference_files(true).await?;
        let docs = select_documents(&files, ids);
        if docs.is_empty() {
            return Err(ChatError::Content(empty_message.to_owned()));
        }
        Ok(AskContext::Inline { file_context: combine_documents(&docs), file_ids: ids.to_vec() })
    }

    // --- Files ---

    /// Add files to the pending upload batch.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] and appends the explanation as an
    /// assistant message when the batch would exceed the configured limit.
    /// Nothing is added in that case.
    pub fn select_files(&self, files: Vec<UploadFile>) -> Result<usize, ChatError> {
        let max = self.registry.config().max_upload_files;
        let current = self.pending.borrow().len();
        if current + files.len() > max {
            let message = format!(
                "❌ Maximum {max} files allowed. You already have {current} file(s) selected. Please select up to {} more file(s).",
                max.saturating_sub(current)
            );
            self.registry.push_local(Role::Assistant, message.clone());
            return Err(ChatError::Validation(message));
        }
        let mut pending = self.pending.borrow_mut();
        pending.extend(files);
        Ok(pending.len())
    }

    pub fn remove_selected(&self, index: usize) -> Option<UploadFile> {
        let mut pending = self.pending.borrow_mut();
        (index < pending.len()).then(|| pending.remove(index))
    }

    #[must_use]
    pub fn pending_names(&self) -> Vec<String> {
        self.pending.borrow().iter().map(|f| f.name.clone()).collect()
    }

    /// Upload the pending batch in one request and report per file.
    /// Successful ids become the uploaded-files context.
    pub async fn upload_selected(&self) -> Vec<FileId> {
        let files = std::mem::take(&mut *self.pending.borrow_mut());
        if files.is_empty() {
            return Vec::new();
        }
        for file in &files {
            self.registry.push_local(Role::User, format!("📎 {}", file.name));
        }

        let guard = TypingGuard::raise(&self.registry);
        let email = self.registry.user_email();
        let result = self.registry.api().upload_files(&files, email.as_deref()).await;
        drop(guard);

        let report = match result {
            Ok(report) => report,
            Err(ChatError::Server { message, .. }) => {
                warn!(error = %message, "upload rejected");
                self.registry.push_local(Role::Assistant, format!("❌ Upload failed: {message}"));
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "upload failed");
                self.registry.push_local(Role::Assistant, format!("❌ Error uploading files: {e}"));
                return Vec::new();
            }
        };

        let mut uploaded = Vec::new();
        for (index, outcome) in report.files.iter().enumerate() {
            let name = outcome
                .file_name
                .clone()
                .or_else(|| files.get(index).map(|f| f.name.clone()))
                .unwrap_or_else(|| "Unknown file".to_owned());
            match (outcome.success, outcome.file_id) {
                (true, Some(id)) => {
                    uploaded.push(id);
                    self.registry
                        .push_local(Role::Assistant, format!("✅ File \"{name}\" uploaded successfully!"));
                }
                _ => {
                    let reason = outcome.error.as_deref().unwrap_or("Unknown error");
                    self.registry
                        .push_local(Role::Assistant, format!("❌ Failed to upload \"{name}\": {reason}"));
                }
            }
        }

        let summary = if report.failed_uploads == 0 {
            format!(
                "✅ All {} file(s) uploaded successfully! You can now ask questions about these documents.",
                report.successful_uploads
            )
        } else {
            format!(
                "✅ {} file(s) uploaded successfully. {} file(s) failed.",
                report.successful_uploads, report.failed_uploads
            )
        };
        self.registry.push_local(Role::Assistant, summary);
        info!(count = uploaded.len(), failed = report.failed_uploads, "upload finished");
        self.registry.register_uploads(&uploaded);
        uploaded
    }

    // --- Playbook bootstrap ---

    /// Ask the configured playbook question against the knowledge-base files
    /// (or every active reference file when none are marked). On success the
    /// files become the playbook and uploads are cleared.
    pub async fn start_project(&self) -> ChatMessage {
        let guard = TypingGuard::raise(&self.registry);
        let reply = match self.bootstrap_playbook().await {
            Ok(reply) => reply,
            Err(ChatError::Content(message) | ChatError::Validation(message)) => message,
            Err(e) => {
                warn!(error = %e, "start project failed");
                format!("Error starting project: {e}. Please try again.")
            }
        };
        drop(guard);
        self.registry.append_message(Role::Assistant, reply).await
    }

    async fn bootstrap_playbook(&self) -> Result<String, ChatError> {
        let api = self.registry.api();
        let files = api.list_reference_files(true).await?;

        let marked: Vec<FileId> = self.registry.with_state(|s| s.knowledge_base.iter().copied().collect());
        let ids: Vec<FileId> = if marked.is_empty() {
            files.iter().filter(|f| f.is_active).map(|f| f.id).collect()
        } else {
            marked
        };
        if ids.is_empty() {
            return Err(ChatError::Validation(NO_MANDATORY_FILES.to_owned()));
        }

        let docs = select_documents(&files, &ids);
        if docs.is_empty() {
            return Err(ChatError::Content(NO_FILE_CONTENT.to_owned()));
        }
        let file_context = combine_documents(&docs);
        if !has_enough_content(&file_context) {
            return Err(ChatError::Content(THIN_FILE_CONTENT.to_owned()));
        }

        let question = self.registry.config().playbook_question.clone();
        let chat_id = self.registry.ensure_active_chat();
        self.registry.append_message(Role::User, question.clone()).await;
        self.registry.set_preview_if_empty(&question);

        let request = AskRequest {
            question,
            chat_id: chat_id.clone(),
            user_email: self.registry.user_email(),
            context: AskContext::Inline { file_context, file_ids: ids.clone() },
        };
        let reply = api.ask(&request).await?;
        if let Some(server_id) = &reply.chat_id {
            self.registry.repoint_chat(&chat_id, server_id);
        }

        if let Some(answer) = reply.answer() {
            info!(count = ids.len(), "playbook established");
            self.registry.set_playbook(ids);
            self.registry.clear_uploads();
            return Ok(markup::render(answer));
        }
        if reply.success {
            let text = reply.message.as_deref().unwrap_or("No response received");
            return Ok(markup::render(text));
        }
        let reason = reply.error.or(reply.message).unwrap_or_else(|| "Unknown error".to_owned());
        Ok(format!("I'm sorry, I encountered an error: {reason}"))
    }
}

/// Assistant text for a payload that came back without an answer.
fn failure_text(question: &str, source: &ContextSource, reply: &AskReply) -> String {
    let server_text = reply.error.as_deref().or(reply.message.as_deref()).filter(|t| !t.is_empty());
    match (source, server_text) {
        (ContextSource::None, Some(text)) => markup::render(text),
        (ContextSource::None, None) => markup::render(canned_reply(question)),
        (_, Some(text)) => text.to_owned(),
        (_, None) => GENERIC_ERROR_REPLY.to_owned(),
    }
}

fn source_label(source: &ContextSource) -> &'static str {
    match source {
        ContextSource::UploadedFiles(_) => "uploaded_files",
        ContextSource::Playbook(_) => "playbook",
        ContextSource::None => "none",
    }
}
