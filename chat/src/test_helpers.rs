//! In-memory portal used by the registry and router tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::api::{AskApi, ChatApi, FileApi, PortalApi, ProjectApi, SessionApi};
use crate::config::PortalConfig;
use crate::error::ChatError;
use crate::registry::Registry;
use crate::router::Router;
use crate::store::MemoryStore;
use crate::types::{
    AskReply, AskRequest, ChatHistory, ChatId, CreatedProject, FileId, Project, ProjectId,
    ReferenceFile, Role, SessionInfo, SessionSummary, UploadFile, UploadReport, User,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CurrentSession,
    Logout,
    ListSessions,
    FetchMessages(ChatId),
    SaveMessage { chat_id: ChatId, role: Role, message: String },
    SaveConversation { chat_id: ChatId, json: String },
    CreateChat(ChatId),
    Upload(Vec<String>),
    ListReferenceFiles { include_content: bool },
    DeleteReferenceFile(FileId),
    Download(FileId),
    KnowledgeBase,
    MarkKnowledgeBase(FileId),
    UnmarkKnowledgeBase(FileId),
    Ask(AskRequest),
    ListProjects,
    CreateProject(String),
    DeleteProject(ProjectId),
}

/// Records every call and answers from configurable fixtures. `ask` replies
/// are queued; an empty queue answers `answer: <question>`.
#[derive(Default)]
pub struct FakePortal {
    pub calls: RefCell<Vec<Call>>,
    pub session: RefCell<Option<SessionInfo>>,
    pub sessions: RefCell<Vec<SessionSummary>>,
    pub histories: RefCell<HashMap<ChatId, ChatHistory>>,
    pub reference_files: RefCell<Vec<ReferenceFile>>,
    pub knowledge_base: RefCell<Vec<FileId>>,
    pub upload_result: RefCell<Option<Result<UploadReport, ChatError>>>,
    pub ask_replies: RefCell<Vec<Result<AskReply, ChatError>>>,
    pub projects: RefCell<Vec<Project>>,
    pub created_project: RefCell<Option<CreatedProject>>,
    /// Every read fails with a transport error while set.
    pub offline: Cell<bool>,
    /// Every save fails while set.
    pub reject_saves: Cell<bool>,
    /// When set, the next `ask` waits for the paired sender before answering.
    pub ask_gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl FakePortal {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn ask_requests(&self) -> Vec<AskRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Ask(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn queue_ask(&self, reply: Result<AskReply, ChatError>) {
        self.ask_replies.borrow_mut().push(reply);
    }

    /// Hold the next `ask` until the returned sender fires or drops.
    pub fn gate_ask(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.ask_gate.borrow_mut() = Some(rx);
        tx
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn read_check(&self) -> Result<(), ChatError> {
        if self.offline.get() {
            Err(ChatError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn save_check(&self) -> Result<(), ChatError> {
        if self.reject_saves.get() {
            Err(ChatError::server(Some(500), Some("database unavailable".into())))
        } else {
            Ok(())
        }
    }
}

#[async_trait(?Send)]
impl SessionApi for FakePortal {
    async fn current_session(&self) -> Result<Option<SessionInfo>, ChatError> {
        self.record(Call::CurrentSession);
        self.read_check()?;
        Ok(self.session.borrow().clone())
    }

    async fn logout(&self) -> Result<(), ChatError> {
        self.record(Call::Logout);
        self.save_check()
    }
}

#[async_trait(?Send)]
impl ChatApi for FakePortal {
    async fn list_sessions(&self, _user_email: &str) -> Result<Vec<SessionSummary>, ChatError> {
        self.record(Call::ListSessions);
        self.read_check()?;
        Ok(self.sessions.borrow().clone())
    }

    async fn fetch_messages(&self, chat_id: &ChatId, _user_email: &str) -> Result<ChatHistory, ChatError> {
        self.record(Call::FetchMessages(chat_id.clone()));
        self.read_check()?;
        self.histories
            .borrow()
            .get(chat_id)
            .cloned()
            .ok_or_else(|| ChatError::server(Some(404), Some("Chat not found".into())))
    }

    async fn save_message(
        &self,
        chat_id: &ChatId,
        role: Role,
        message: &str,
        _user_email: &str,
    ) -> Result<(), ChatError> {
        self.record(Call::SaveMessage { chat_id: chat_id.clone(), role, message: message.to_owned() });
        self.save_check()
    }

    async fn save_conversation(
        &self,
        chat_id: &ChatId,
        conversation_json: &str,
        _user_email: &str,
    ) -> Result<(), ChatError> {
        self.record(Call::SaveConversation { chat_id: chat_id.clone(), json: conversation_json.to_owned() });
        self.save_check()
    }

    async fn create_chat(&self, chat_id: &ChatId, _user_email: &str) -> Result<(), ChatError> {
        self.record(Call::CreateChat(chat_id.clone()));
        self.save_check()
    }
}

#[async_trait(?Send)]
impl FileApi for FakePortal {
    async fn upload_files(&self, files: &[UploadFile], _uploaded_by: Option<&str>) -> Result<UploadReport, ChatError> {
        self.record(Call::Upload(files.iter().map(|f| f.name.clone()).collect()));
        self.read_check()?;
        self.upload_result
            .borrow()
            .clone()
            .unwrap_or_else(|| Err(ChatError::server(Some(500), None)))
    }

    async fn list_reference_files(&self, include_content: bool) -> Result<Vec<ReferenceFile>, ChatError> {
        self.record(Call::ListReferenceFiles { include_content });
        self.read_check()?;
        let files = self.reference_files.borrow().clone();
        if include_content {
            return Ok(files);
        }
        Ok(files.into_iter().map(|f| ReferenceFile { extracted_text: None, ..f }).collect())
    }

    async fn delete_reference_file(&self, file_id: FileId) -> Result<(), ChatError> {
        self.record(Call::DeleteReferenceFile(file_id));
        self.save_check()?;
        self.reference_files.borrow_mut().retain(|f| f.id != file_id);
        Ok(())
    }

    async fn download_reference_file(&self, file_id: FileId) -> Result<Vec<u8>, ChatError> {
        self.record(Call::Download(file_id));
        self.read_check()?;
        Ok(b"%PDF".to_vec())
    }

    async fn knowledge_base(&self, _user_email: &str) -> Result<Vec<FileId>, ChatError> {
        self.record(Call::KnowledgeBase);
        self.read_check()?;
        Ok(self.knowledge_base.borrow().clone())
    }

    async fn mark_knowledge_base(&self, file_id: FileId, _user_email: &str) -> Result<(), ChatError> {
        self.record(Call::MarkKnowledgeBase(file_id));
        self.save_check()
    }

    async fn unmark_knowledge_base(&self, file_id: FileId, _user_email: &str) -> Result<(), ChatError> {
        self.record(Call::UnmarkKnowledgeBase(file_id));
        self.save_check()
    }
}

#[async_trait(?Send)]
impl AskApi for FakePortal {
    async fn ask(&self, request: &AskRequest) -> Result<AskReply, ChatError> {
        self.record(Call::Ask(request.clone()));
        let gate = self.ask_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let mut replies = self.ask_replies.borrow_mut();
        if replies.is_empty() {
            Ok(AskReply {
                success: true,
                response: Some(format!("answer: {}", request.question)),
                chat_id: Some(request.chat_id.clone()),
                ..AskReply::default()
            })
        } else {
            replies.remove(0)
        }
    }
}

#[async_trait(?Send)]
impl ProjectApi for FakePortal {
    async fn list_projects(&self, _user_email: &str) -> Result<Vec<Project>, ChatError> {
        self.record(Call::ListProjects);
        self.read_check()?;
        Ok(self.projects.borrow().clone())
    }

    async fn create_project(&self, name: &str, _user_email: &str) -> Result<CreatedProject, ChatError> {
        self.record(Call::CreateProject(name.to_owned()));
        self.save_check()?;
        self.created_project
            .borrow()
            .clone()
            .ok_or_else(|| ChatError::server(Some(200), Some("Failed to create project".into())))
    }

    async fn delete_project(&self, project_id: &ProjectId, _user_email: &str) -> Result<(), ChatError> {
        self.record(Call::DeleteProject(project_id.clone()));
        self.save_check()
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn test_user() -> User {
    User { id: 1, email: "pm@example.com".into(), name: "Pat Manager".into() }
}

pub fn reference_file(id: i64, name: &str, text: &str) -> ReferenceFile {
    ReferenceFile {
        id: FileId(id),
        file_name: name.to_owned(),
        extracted_text: Some(text.to_owned()),
        is_active: true,
        file_size: Some(text.len() as u64),
    }
}

/// Registry over `fake` with a fresh memory store, not signed in.
pub fn registry_with(fake: &Rc<FakePortal>, store: Rc<MemoryStore>) -> Registry {
    let api: Rc<dyn PortalApi> = fake.clone();
    Registry::new(api, store, PortalConfig::default())
}

/// Signed-in router with the call log cleared.
pub async fn signed_in_router(fake: &Rc<FakePortal>) -> Router {
    let registry = registry_with(fake, Rc::new(MemoryStore::new()));
    registry.init(test_user()).await;
    fake.clear_calls();
    Router::new(registry)
}
