//! `reqwest` implementation of the portal services.
//!
//! Thin wrapper over the JSON/multipart endpoints. Status and body handling
//! lives in the pure `parse_*` functions so it can be tested without a server.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures become [`ChatError::Transport`]. A non-2xx status or a
//! `success: false` payload becomes [`ChatError::Server`] carrying the
//! payload's `error`/`message` when one decodes. The question endpoint is the
//! exception: its payload is returned even on failure because it may carry a
//! server-issued chat id.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::wire::{
    Ack, AskEnvelope, CreateProjectEnvelope, KnowledgeBaseEnvelope, MessagesEnvelope,
    ProjectsEnvelope, ReferenceFilesEnvelope, SessionEnvelope, SessionsEnvelope, UploadEnvelope,
};
use super::{AskApi, ChatApi, FileApi, ProjectApi, SessionApi};
use crate::config::PortalConfig;
use crate::error::ChatError;
use crate::types::{
    AskContext, AskReply, AskRequest, ChatHistory, ChatId, CreatedProject, FileId, Project,
    ProjectId, ReferenceFile, Role, SessionInfo, SessionSummary, UploadFile, UploadReport,
};

// =============================================================================
// CLIENT
// =============================================================================

pub struct PortalClient {
    http: reqwest::Client,
    config: PortalConfig,
}

impl PortalClient {
    /// Build a client. Native builds apply the configured timeouts; the
    /// browser's fetch has no per-request timeout knob.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: PortalConfig) -> Result<Self, ChatError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .timeout(std::time::Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(std::time::Duration::from_secs(config.timeouts.connect_secs));
        let http = builder.build().map_err(|e| ChatError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(u16, String), ChatError> {
        // Session lookup rides on the portal's cookie.
        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok((status, text))
    }

    /// Send and require a `success: true` acknowledgement.
    async fn send_ack(&self, request: reqwest::RequestBuilder) -> Result<(), ChatError> {
        let (status, text) = self.send(request).await?;
        let ack: Ack = parse_json(status, &text)?;
        require_success(status, ack.success, ack.reason())
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Decode a 2xx body. Any other status becomes a server error carrying the
/// body's `error`/`message` when it decodes as an acknowledgement.
fn parse_json<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ChatError> {
    if !is_success_status(status) {
        let reason = serde_json::from_str::<Ack>(body).ok().and_then(|a| a.reason());
        return Err(ChatError::server(Some(status), reason));
    }
    Ok(serde_json::from_str(body)?)
}

fn require_success(status: u16, success: bool, reason: Option<String>) -> Result<(), ChatError> {
    if success {
        Ok(())
    } else {
        Err(ChatError::server(Some(status), reason))
    }
}

/// Decode the question endpoint's payload whatever the status.
fn parse_ask(status: u16, body: &str) -> Result<AskReply, ChatError> {
    match serde_json::from_str::<AskEnvelope>(body) {
        Ok(envelope) => Ok(envelope.into_domain()),
        Err(e) if is_success_status(status) => Err(e.into()),
        Err(_) => Err(ChatError::server(Some(status), None)),
    }
}

fn ask_form(request: &AskRequest) -> Form {
    let mut form = Form::new().text("question", request.question.clone());
    match &request.context {
        AskContext::None => {}
        AskContext::File(file_id) => {
            form = form.text("file_id", file_id.to_string());
        }
        AskContext::Inline { file_context, file_ids } => {
            let ids = serde_json::to_string(file_ids).unwrap_or_else(|_| "[]".to_owned());
            form = form
                .text("file_context", file_context.clone())
                .text("mandatory_file_ids", ids);
        }
    }
    form = form.text("chat_id", request.chat_id.to_string());
    if let Some(email) = &request.user_email {
        form = form.text("user_email", email.clone());
    }
    form
}

fn file_part(file: &UploadFile) -> Result<Part, ChatError> {
    let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
    match &file.mime {
        Some(mime) => part
            .mime_str(mime)
            .map_err(|e| ChatError::Validation(format!("invalid content type for {}: {e}", file.name))),
        None => Ok(part),
    }
}

// =============================================================================
// SERVICES
// =============================================================================

#[async_trait(?Send)]
impl SessionApi for PortalClient {
    async fn current_session(&self) -> Result<Option<SessionInfo>, ChatError> {
        let (status, text) = self.send(self.http.get(self.url("/api/auth/session"))).await?;
        let envelope: SessionEnvelope = parse_json(status, &text)?;
        Ok(envelope.into_domain())
    }

    async fn logout(&self) -> Result<(), ChatError> {
        self.send_ack(self.http.post(self.url("/api/auth/logout"))).await
    }
}

#[async_trait(?Send)]
impl ChatApi for PortalClient {
    async fn list_sessions(&self, user_email: &str) -> Result<Vec<SessionSummary>, ChatError> {
        let request = self
            .http
            .get(self.url("/api/chat/sessions"))
            .query(&[("user_email", user_email)]);
        let (status, text) = self.send(request).await?;
        let envelope: SessionsEnvelope = parse_json(status, &text)?;
        require_success(status, envelope.success, envelope.error.clone())?;
        Ok(envelope.into_domain())
    }

    async fn fetch_messages(&self, chat_id: &ChatId, user_email: &str) -> Result<ChatHistory, ChatError> {
        let request = self
            .http
            .get(self.url("/api/chat/messages"))
            .query(&[("chat_id", chat_id.as_str()), ("user_email", user_email)]);
        let (status, text) = self.send(request).await?;
        let envelope: MessagesEnvelope = parse_json(status, &text)?;
        require_success(status, envelope.success, envelope.error.clone())?;
        Ok(envelope.into_domain())
    }

    async fn save_message(
        &self,
        chat_id: &ChatId,
        role: Role,
        message: &str,
        user_email: &str,
    ) -> Result<(), ChatError> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("role", role.as_str())
            .text("message", message.to_owned())
            .text("user_email", user_email.to_owned());
        self.send_ack(self.http.post(self.url("/api/chat/save-message")).multipart(form))
            .await
    }

    async fn save_conversation(
        &self,
        chat_id: &ChatId,
        conversation_json: &str,
        user_email: &str,
    ) -> Result<(), ChatError> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("conversation_json", conversation_json.to_owned())
            .text("user_email", user_email.to_owned());
        self.send_ack(self.http.post(self.url("/api/chat/save-conversation")).multipart(form))
            .await
    }

    async fn create_chat(&self, chat_id: &ChatId, user_email: &str) -> Result<(), ChatError> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("user_email", user_email.to_owned());
        self.send_ack(self.http.post(self.url("/api/chat/create")).multipart(form))
            .await
    }
}

#[async_trait(?Send)]
impl FileApi for PortalClient {
    async fn upload_files(&self, files: &[UploadFile], uploaded_by: Option<&str>) -> Result<UploadReport, ChatError> {
        let mut form = Form::new();
        for file in files {
            form = form.part("files", file_part(file)?);
        }
        if let Some(email) = uploaded_by {
            form = form.text("uploaded_by", email.to_owned());
        }
        let (status, text) = self
            .send(self.http.post(self.url("/api/upload-file")).multipart(form))
            .await?;
        let envelope: UploadEnvelope = parse_json(status, &text)?;
        let reason = envelope.error.clone().or_else(|| envelope.message.clone());
        require_success(status, envelope.success, reason)?;
        Ok(envelope.into_domain())
    }

    async fn list_reference_files(&self, include_content: bool) -> Result<Vec<ReferenceFile>, ChatError> {
        let mut request = self.http.get(self.url("/api/mandatory-files"));
        if include_content {
            request = request.query(&[("include_content", "true")]);
        }
        let (status, text) = self.send(request).await?;
        let envelope: ReferenceFilesEnvelope = parse_json(status, &text)?;
        require_success(status, envelope.success, envelope.error.clone())?;
        Ok(envelope.into_domain())
    }

    async fn delete_reference_file(&self, file_id: FileId) -> Result<(), ChatError> {
        self.send_ack(self.http.delete(self.url(&format!("/api/mandatory-files/{file_id}"))))
            .await
    }

    async fn download_reference_file(&self, file_id: FileId) -> Result<Vec<u8>, ChatError> {
        let request = self.http.get(self.url(&format!("/api/mandatory-files/{file_id}/download")));
        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();
        let response = request.send().await?;
        let status = response.status().as_u16();
        if !is_success_status(status) {
            let text = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<Ack>(&text).ok().and_then(|a| a.reason());
            return Err(ChatError::server(Some(status), reason));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn knowledge_base(&self, user_email: &str) -> Result<Vec<FileId>, ChatError> {
        let request = self
            .http
            .get(self.url("/api/project-knowledge-base"))
            .query(&[("user_email", user_email)]);
        let (status, text) = self.send(request).await?;
        let envelope: KnowledgeBaseEnvelope = parse_json(status, &text)?;
        require_success(status, envelope.success, envelope.error.clone())?;
        Ok(envelope.file_ids)
    }

    async fn mark_knowledge_base(&self, file_id: FileId, user_email: &str) -> Result<(), ChatError> {
        let form = Form::new()
            .text("file_id", file_id.to_string())
            .text("user_email", user_email.to_owned());
        self.send_ack(self.http.post(self.url("/api/project-knowledge-base/add")).multipart(form))
            .await
    }

    async fn unmark_knowledge_base(&self, file_id: FileId, user_email: &str) -> Result<(), ChatError> {
        let request = self
            .http
            .delete(self.url("/api/project-knowledge-base/remove"))
            .query(&[("file_id", file_id.to_string().as_str()), ("user_email", user_email)]);
        self.send_ack(request).await
    }
}

#[async_trait(?Send)]
impl AskApi for PortalClient {
    async fn ask(&self, request: &AskRequest) -> Result<AskReply, ChatError> {
        let (status, text) = self
            .send(self.http.post(self.url("/api/ask-question")).multipart(ask_form(request)))
            .await?;
        parse_ask(status, &text)
    }
}

#[async_trait(?Send)]
impl ProjectApi for PortalClient {
    async fn list_projects(&self, user_email: &str) -> Result<Vec<Project>, ChatError> {
        let request = self
            .http
            .get(self.url("/api/projects"))
            .query(&[("user_email", user_email)]);
        let (status, text) = self.send(request).await?;
        let envelope: ProjectsEnvelope = parse_json(status, &text)?;
        require_success(status, envelope.success, envelope.error.clone())?;
        Ok(envelope.into_domain())
    }

    async fn create_project(&self, name: &str, user_email: &str) -> Result<CreatedProject, ChatError> {
        let form = Form::new()
            .text("name", name.trim().to_owned())
            .text("user_email", user_email.to_owned());
        let (status, text) = self
            .send(self.http.post(self.url("/api/projects")).multipart(form))
            .await?;
        let envelope: CreateProjectEnvelope = parse_json(status, &text)?;
        let reason = envelope
            .message
            .clone()
            .or_else(|| envelope.error.clone())
            .unwrap_or_else(|| "Failed to create project".to_owned());
        envelope
            .into_domain()
            .ok_or_else(|| ChatError::server(Some(status), Some(reason)))
    }

    async fn delete_project(&self, project_id: &ProjectId, user_email: &str) -> Result<(), ChatError> {
        let request = self
            .http
            .delete(self.url(&format!("/api/projects/{project_id}")))
            .query(&[("user_email", user_email)]);
        self.send_ack(request).await
    }
}
