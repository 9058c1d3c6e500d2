//! JSON envelopes of the portal services.
//!
//! Every field the server may omit carries `#[serde(default)]` so partial
//! payloads still decode. `into_domain` conversions drop entries that lack
//! the one field the panel cannot do without.

#[cfg(test)]
#[path = "wire_test.rs"]
mod wire_test;

use serde::Deserialize;

use crate::types::{
    AskReply, ChatHistory, ChatId, ConversationRef, CreatedProject, FileId, HistoryMessage,
    Project, ProjectId, ProjectLink, ReferenceFile, Role, SessionInfo, SessionSummary, User,
    UploadOutcome, UploadReport,
};

/// Generic `{success, message?, error?}` acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Ack {
    /// Best explanation the server gave for a failure.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.error.clone().or_else(|| self.message.clone())
    }
}

// =============================================================================
// SESSION
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl SessionEnvelope {
    #[must_use]
    pub fn into_domain(self) -> Option<SessionInfo> {
        if !self.success {
            return None;
        }
        match (self.session_id, self.user) {
            (Some(session_id), Some(user)) => Some(SessionInfo { session_id, user }),
            _ => None,
        }
    }
}

// =============================================================================
// CHAT
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireSession {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub first_message_preview: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionsEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub chats: Vec<WireSession>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SessionsEnvelope {
    #[must_use]
    pub fn into_domain(self) -> Vec<SessionSummary> {
        self.chats
            .into_iter()
            .filter_map(|s| {
                let chat_id = s.chat_id.filter(|id| !id.is_empty())?;
                Some(SessionSummary {
                    chat_id: ChatId::from(chat_id),
                    preview: s.first_message_preview.unwrap_or_default(),
                    updated_at: s.updated_at.or(s.last_message_at),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireProjectLink {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub project: Option<WireProjectLink>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MessagesEnvelope {
    #[must_use]
    pub fn into_domain(self) -> ChatHistory {
        ChatHistory {
            messages: self
                .messages
                .into_iter()
                .map(|m| HistoryMessage {
                    role: if m.role == "assistant" { Role::Assistant } else { Role::User },
                    message: m.message.unwrap_or_default(),
                    created_at: m.created_at,
                })
                .collect(),
            project: self.project.and_then(|p| {
                Some(ProjectLink { id: ProjectId(p.id?), name: p.name.unwrap_or_default() })
            }),
        }
    }
}

// =============================================================================
// FILES
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireUploadResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub file_id: Option<FileId>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub files: Vec<WireUploadResult>,
    #[serde(default)]
    pub successful_uploads: Option<usize>,
    #[serde(default)]
    pub failed_uploads: Option<usize>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadEnvelope {
    /// Per-file outcomes. Aggregate counts fall back to tallying the files.
    #[must_use]
    pub fn into_domain(self) -> UploadReport {
        let files: Vec<UploadOutcome> = self
            .files
            .into_iter()
            .map(|f| UploadOutcome {
                success: f.success && f.file_id.is_some(),
                file_id: f.file_id,
                file_name: f.file_name,
                error: f.error,
            })
            .collect();
        let ok = files.iter().filter(|f| f.success).count();
        UploadReport {
            successful_uploads: self.successful_uploads.unwrap_or(ok),
            failed_uploads: self.failed_uploads.unwrap_or(files.len() - ok),
            files,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireReferenceFile {
    pub id: FileId,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub extracted_text: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub file_size: Option<u64>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceFilesEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub files: Vec<WireReferenceFile>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ReferenceFilesEnvelope {
    #[must_use]
    pub fn into_domain(self) -> Vec<ReferenceFile> {
        self.files
            .into_iter()
            .map(|f| ReferenceFile {
                id: f.id,
                file_name: f.file_name,
                extracted_text: f.extracted_text,
                is_active: f.is_active,
                file_size: f.file_size,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KnowledgeBaseEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub file_ids: Vec<FileId>,
    #[serde(default)]
    pub error: Option<String>,
}

// =============================================================================
// QUESTION ANSWERING
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AskEnvelope {
    #[must_use]
    pub fn into_domain(self) -> AskReply {
        AskReply {
            success: self.success,
            response: self.response,
            chat_id: self.chat_id.filter(|id| !id.is_empty()).map(ChatId::from),
            error: self.error,
            message: self.message,
        }
    }
}

// =============================================================================
// PROJECTS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireConversation {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub first_message_preview: Option<String>,
}

impl WireConversation {
    fn into_domain(self) -> Option<ConversationRef> {
        Some(ConversationRef {
            id: self.id?,
            chat_id: ChatId::from(self.chat_id.filter(|id| !id.is_empty())?),
            title: self.title.unwrap_or_default(),
            preview: self.first_message_preview.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireProject {
    pub id: ProjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conversations: Vec<WireConversation>,
}

impl WireProject {
    fn into_domain(self) -> Project {
        Project {
            id: self.id,
            name: self.name,
            conversations: self
                .conversations
                .into_iter()
                .filter_map(WireConversation::into_domain)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectsEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub projects: Vec<WireProject>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProjectsEnvelope {
    #[must_use]
    pub fn into_domain(self) -> Vec<Project> {
        self.projects.into_iter().map(WireProject::into_domain).collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProjectEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub project: Option<WireProject>,
    #[serde(default)]
    pub conversation: Option<WireConversation>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CreateProjectEnvelope {
    /// The new project with its default conversation as the only entry.
    #[must_use]
    pub fn into_domain(self) -> Option<CreatedProject> {
        if !self.success {
            return None;
        }
        let conversation = self.conversation?.into_domain()?;
        let mut project = self.project?.into_domain();
        project.conversations = vec![conversation.clone()];
        Some(CreatedProject { project, conversation })
    }
}
