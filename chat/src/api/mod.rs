//! Collaborating portal services.
//!
//! SYSTEM CONTEXT
//! ==============
//! The registry and router never speak HTTP directly. They hold an
//! `Rc<dyn PortalApi>`; [`http::PortalClient`] is the production impl and the
//! test suite substitutes an in-memory fake. Traits are `?Send` because the
//! browser build is single-threaded and futures there are not `Send`.

pub mod http;
pub mod wire;

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::{
    AskReply, AskRequest, ChatHistory, ChatId, CreatedProject, FileId, Project, ProjectId,
    ReferenceFile, Role, SessionInfo, SessionSummary, UploadFile, UploadReport,
};

/// Session lookup and sign-out.
#[async_trait(?Send)]
pub trait SessionApi {
    /// Current session from the cookie, `None` when signed out or expired.
    async fn current_session(&self) -> Result<Option<SessionInfo>, ChatError>;

    async fn logout(&self) -> Result<(), ChatError>;
}

/// Persisted chat records.
#[async_trait(?Send)]
pub trait ChatApi {
    async fn list_sessions(&self, user_email: &str) -> Result<Vec<SessionSummary>, ChatError>;

    async fn fetch_messages(&self, chat_id: &ChatId, user_email: &str) -> Result<ChatHistory, ChatError>;

    async fn save_message(
        &self,
        chat_id: &ChatId,
        role: Role,
        message: &str,
        user_email: &str,
    ) -> Result<(), ChatError>;

    /// Store a paired transcript; `conversation_json` is the serialized body.
    async fn save_conversation(
        &self,
        chat_id: &ChatId,
        conversation_json: &str,
        user_email: &str,
    ) -> Result<(), ChatError>;

    async fn create_chat(&self, chat_id: &ChatId, user_email: &str) -> Result<(), ChatError>;
}

/// Uploaded and reference documents.
#[async_trait(?Send)]
pub trait FileApi {
    async fn upload_files(&self, files: &[UploadFile], uploaded_by: Option<&str>) -> Result<UploadReport, ChatError>;

    async fn list_reference_files(&self, include_content: bool) -> Result<Vec<ReferenceFile>, ChatError>;

    async fn delete_reference_file(&self, file_id: FileId) -> Result<(), ChatError>;

    async fn download_reference_file(&self, file_id: FileId) -> Result<Vec<u8>, ChatError>;

    /// File ids the user marked for the project knowledge base.
    async fn knowledge_base(&self, user_email: &str) -> Result<Vec<FileId>, ChatError>;

    async fn mark_knowledge_base(&self, file_id: FileId, user_email: &str) -> Result<(), ChatError>;

    async fn unmark_knowledge_base(&self, file_id: FileId, user_email: &str) -> Result<(), ChatError>;
}

/// Question answering.
#[async_trait(?Send)]
pub trait AskApi {
    /// A non-success payload is returned as `Ok` so the caller can read the
    /// server's chat id and error text. `Err` means no usable payload arrived.
    async fn ask(&self, request: &AskRequest) -> Result<AskReply, ChatError>;
}

/// Project tree.
#[async_trait(?Send)]
pub trait ProjectApi {
    async fn list_projects(&self, user_email: &str) -> Result<Vec<Project>, ChatError>;

    async fn create_project(&self, name: &str, user_email: &str) -> Result<CreatedProject, ChatError>;

    async fn delete_project(&self, project_id: &ProjectId, user_email: &str) -> Result<(), ChatError>;
}

/// Every service the panel talks to.
pub trait PortalApi: SessionApi + ChatApi + FileApi + AskApi + ProjectApi {}

impl<T> PortalApi for T where T: SessionApi + ChatApi + FileApi + AskApi + ProjectApi {}
