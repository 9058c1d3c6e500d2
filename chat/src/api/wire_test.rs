use super::*;

fn decode<T: serde::de::DeserializeOwned>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap()
}

// =============================================================================
// Chat
// =============================================================================

#[test]
fn sessions_prefer_updated_at_and_skip_missing_ids() {
    let env: SessionsEnvelope = decode(
        r#"{"success":true,"chats":[
            {"chat_id":"a","first_message_preview":"hi","updated_at":"2026-01-02T00:00:00","last_message_at":"2025-01-01T00:00:00"},
            {"chat_id":"b","last_message_at":"2026-01-01T00:00:00"},
            {"first_message_preview":"orphan"},
            {"chat_id":""}
        ]}"#,
    );
    let sessions = env.into_domain();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].updated_at.as_deref(), Some("2026-01-02T00:00:00"));
    assert_eq!(sessions[1].chat_id.as_str(), "b");
    assert_eq!(sessions[1].preview, "");
    assert_eq!(sessions[1].updated_at.as_deref(), Some("2026-01-01T00:00:00"));
}

#[test]
fn messages_map_roles_and_project() {
    let env: MessagesEnvelope = decode(
        r#"{"success":true,
            "messages":[{"role":"user","message":"q"},{"role":"assistant","message":null,"created_at":"t"},{"role":"system","message":"s"}],
            "project":{"id":"p-1","name":"Apollo"}}"#,
    );
    let history = env.into_domain();
    let roles: Vec<_> = history.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, [Role::User, Role::Assistant, Role::User]);
    assert_eq!(history.messages[1].message, "");
    assert_eq!(history.project, Some(ProjectLink { id: ProjectId("p-1".into()), name: "Apollo".into() }));
}

#[test]
fn project_link_without_id_is_dropped() {
    let env: MessagesEnvelope = decode(r#"{"success":true,"messages":[],"project":{"name":"x"}}"#);
    assert_eq!(env.into_domain().project, None);
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn upload_counts_fall_back_to_tally() {
    let env: UploadEnvelope = decode(
        r#"{"success":true,"files":[
            {"success":true,"file_id":11,"file_name":"a.pdf"},
            {"success":false,"file_name":"b.exe","error":"unsupported type"}
        ]}"#,
    );
    let report = env.into_domain();
    assert_eq!(report.successful_uploads, 1);
    assert_eq!(report.failed_uploads, 1);
    assert_eq!(report.files[0].file_id, Some(FileId(11)));
    assert_eq!(report.files[1].error.as_deref(), Some("unsupported type"));
}

#[test]
fn reference_files_default_to_active() {
    let env: ReferenceFilesEnvelope = decode(r#"{"success":true,"files":[{"id":4,"file_name":"charter.pdf"}]}"#);
    let files = env.into_domain();
    assert!(files[0].is_active);
    assert_eq!(files[0].text(), None);
}

// =============================================================================
// Ask and projects
// =============================================================================

#[test]
fn ask_envelope_ignores_blank_chat_id() {
    let env: AskEnvelope = decode(r#"{"success":false,"chat_id":"","error":"model offline"}"#);
    let reply = env.into_domain();
    assert_eq!(reply.chat_id, None);
    assert_eq!(reply.error.as_deref(), Some("model offline"));
    assert_eq!(reply.answer(), None);
}

#[test]
fn projects_drop_conversations_without_chat_id() {
    let env: ProjectsEnvelope = decode(
        r#"{"success":true,"projects":[{"id":"p","name":"Apollo","conversations":[
            {"id":1,"chat_id":"c1","title":"Default chat"},
            {"id":2}
        ]}]}"#,
    );
    let projects = env.into_domain();
    assert_eq!(projects[0].conversations.len(), 1);
    assert_eq!(projects[0].conversations[0].title, "Default chat");
}

#[test]
fn created_project_carries_its_conversation() {
    let env: CreateProjectEnvelope = decode(
        r#"{"success":true,"project":{"id":"p9","name":"Zeus"},
            "conversation":{"id":5,"conversation_id":5,"chat_id":"c9","title":"Default chat"}}"#,
    );
    let created = env.into_domain().unwrap();
    assert_eq!(created.project.conversations, vec![created.conversation.clone()]);
    assert_eq!(created.conversation.chat_id.as_str(), "c9");
}

#[test]
fn failed_project_creation_is_none() {
    let env: CreateProjectEnvelope = decode(r#"{"success":false,"message":"Project name already exists"}"#);
    assert!(env.into_domain().is_none());
}
