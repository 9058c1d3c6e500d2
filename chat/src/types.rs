//! Domain types shared by the registry, router and service seams.
//!
//! DESIGN
//! ======
//! Identifiers are newtypes so a chat token can never be passed where a
//! project id is expected. Wire payloads live in `api::wire` and convert into
//! these types at the HTTP boundary.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque chat token correlating local state with the remote record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    /// Fresh collision-resistant token.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChatId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ChatId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server id of an uploaded or reference file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub i64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server id of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn in the conversation. Assistant text is already rendered markup;
/// user text is plain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub role: Role,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Messages and project linkage returned for one chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatHistory {
    pub messages: Vec<HistoryMessage>,
    pub project: Option<ProjectLink>,
}

/// A persisted message as the chat service returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub role: Role,
    pub message: String,
    pub created_at: Option<String>,
}

/// Sidebar entry for one persisted chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub chat_id: ChatId,
    pub preview: String,
    /// ISO-8601 timestamp of the latest activity, if known.
    pub updated_at: Option<String>,
}

// =============================================================================
// PROJECTS
// =============================================================================

/// Weak reference from a project into the chat registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRef {
    pub id: i64,
    pub chat_id: ChatId,
    pub title: String,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub conversations: Vec<ConversationRef>,
}

/// The project a loaded chat belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLink {
    pub id: ProjectId,
    pub name: String,
}

/// Result of creating a project: the project and its default conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProject {
    pub project: Project,
    pub conversation: ConversationRef,
}

// =============================================================================
// USERS AND FILES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: String,
    pub user: User,
}

/// Administrator-curated document usable as question context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFile {
    pub id: FileId,
    pub file_name: String,
    /// Present only when the listing asked for content.
    pub extracted_text: Option<String>,
    pub is_active: bool,
    pub file_size: Option<u64>,
}

impl ReferenceFile {
    /// Extracted text, if any is non-empty.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.extracted_text.as_deref().filter(|t| !t.is_empty())
    }
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

/// Per-file outcome of an upload batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub success: bool,
    pub file_id: Option<FileId>,
    pub file_name: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub files: Vec<UploadOutcome>,
    pub successful_uploads: usize,
    pub failed_uploads: usize,
}

// =============================================================================
// QUESTION ANSWERING
// =============================================================================

/// Which context backs a question. Precedence is fixed:
/// uploaded files, then playbook, then none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSource {
    /// Files uploaded in this conversation; the most recent one is sent.
    UploadedFiles(Vec<FileId>),
    /// Standing reference files sent as inline text.
    Playbook(Vec<FileId>),
    /// Let the endpoint fall back to its own knowledge base.
    None,
}

impl ContextSource {
    /// Resolve by precedence. Uploads shadow the playbook without erasing it.
    #[must_use]
    pub fn resolve(uploaded: &[FileId], playbook: &[FileId]) -> Self {
        if !uploaded.is_empty() {
            Self::UploadedFiles(uploaded.to_vec())
        } else if !playbook.is_empty() {
            Self::Playbook(playbook.to_vec())
        } else {
            Self::None
        }
    }
}

/// Source-specific payload of an outbound question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskContext {
    None,
    File(FileId),
    Inline { file_context: String, file_ids: Vec<FileId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    pub question: String,
    pub chat_id: ChatId,
    pub user_email: Option<String>,
    pub context: AskContext,
}

/// Raw answer payload. `success == false` carries `error` when the server
/// had something to say.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AskReply {
    pub success: bool,
    pub response: Option<String>,
    pub chat_id: Option<ChatId>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl AskReply {
    /// Non-empty answer text of a successful reply.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.response.as_deref().filter(|r| !r.is_empty())
    }
}
