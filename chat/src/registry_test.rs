use super::*;
use crate::store::MemoryStore;
use crate::test_helpers::{Call, FakePortal, reference_file, registry_with, test_user};
use crate::types::{ChatHistory, ConversationRef, CreatedProject, HistoryMessage, ReferenceFile, SessionInfo};
use std::cell::Cell;

fn setup() -> (Rc<FakePortal>, Rc<MemoryStore>, Registry) {
    let fake = FakePortal::new();
    let store = Rc::new(MemoryStore::new());
    let registry = registry_with(&fake, Rc::clone(&store));
    (fake, store, registry)
}

async fn signed_in() -> (Rc<FakePortal>, Rc<MemoryStore>, Registry) {
    let (fake, store, registry) = setup();
    registry.init(test_user()).await;
    fake.clear_calls();
    (fake, store, registry)
}

fn history(messages: &[(Role, &str)], project: Option<(&str, &str)>) -> ChatHistory {
    ChatHistory {
        messages: messages
            .iter()
            .map(|(role, text)| HistoryMessage {
                role: *role,
                message: (*text).to_owned(),
                created_at: Some("2026-05-01T12:00:00".into()),
            })
            .collect(),
        project: project.map(|(id, name)| ProjectLink { id: ProjectId(id.into()), name: name.into() }),
    }
}

fn project(id: &str, conversations: &[(i64, &str)]) -> Project {
    Project {
        id: ProjectId(id.into()),
        name: format!("Project {id}"),
        conversations: conversations
            .iter()
            .map(|(cid, chat)| ConversationRef {
                id: *cid,
                chat_id: ChatId::from(*chat),
                title: "Default chat".into(),
                preview: String::new(),
            })
            .collect(),
    }
}

fn session(chat: &str, updated_at: Option<&str>) -> SessionSummary {
    SessionSummary {
        chat_id: ChatId::from(chat),
        preview: format!("preview {chat}"),
        updated_at: updated_at.map(str::to_owned),
    }
}

// =============================================================================
// Construction and sign-in
// =============================================================================

#[test]
fn new_reads_selections_from_store() {
    let fake = FakePortal::new();
    let store = Rc::new(MemoryStore::new());
    store.set(PLAYBOOK_KEY, "[1,2]").unwrap();
    store.set(KNOWLEDGE_BASE_KEY, "[5]").unwrap();

    let registry = registry_with(&fake, store);
    let state = registry.snapshot();
    assert_eq!(state.playbook, vec![FileId(1), FileId(2)]);
    assert!(state.knowledge_base.contains(&FileId(5)));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn init_syncs_context_and_creates_chat_record() {
    let (fake, store, registry) = setup();
    *fake.knowledge_base.borrow_mut() = vec![FileId(3)];
    *fake.reference_files.borrow_mut() = vec![
        reference_file(1, "charter.pdf", "scope"),
        ReferenceFile { is_active: false, ..reference_file(2, "old.pdf", "stale") },
    ];

    registry.init(test_user()).await;

    let state = registry.snapshot();
    let chat_id = state.active_chat_id.clone().unwrap();
    assert_eq!(state.user, Some(test_user()));
    assert_eq!(state.playbook, vec![FileId(1)]);
    assert_eq!(state.knowledge_base.iter().copied().collect::<Vec<_>>(), vec![FileId(3)]);
    assert_eq!(store.get(PLAYBOOK_KEY).as_deref(), Some("[1]"));
    assert_eq!(store.get(KNOWLEDGE_BASE_KEY).as_deref(), Some("[3]"));
    assert_eq!(
        fake.calls(),
        vec![
            Call::KnowledgeBase,
            Call::ListReferenceFiles { include_content: false },
            Call::CreateChat(chat_id),
            Call::ListSessions,
            Call::ListProjects,
        ]
    );
}

#[tokio::test]
async fn init_keeps_stored_knowledge_base_when_offline() {
    let (fake, store, _) = setup();
    store.set(KNOWLEDGE_BASE_KEY, "[4]").unwrap();
    let registry = registry_with(&fake, Rc::clone(&store));
    fake.offline.set(true);

    registry.init(test_user()).await;

    let state = registry.snapshot();
    assert!(state.knowledge_base.contains(&FileId(4)));
    assert!(state.playbook.is_empty());
    assert!(state.active_chat_id.is_some());
    assert_eq!(store.get(KNOWLEDGE_BASE_KEY).as_deref(), Some("[4]"));
}

#[tokio::test]
async fn init_does_not_reseed_existing_playbook() {
    let (fake, store, _) = setup();
    store.set(PLAYBOOK_KEY, "[8]").unwrap();
    *fake.reference_files.borrow_mut() = vec![reference_file(1, "charter.pdf", "scope")];
    let registry = registry_with(&fake, Rc::clone(&store));

    registry.init(test_user()).await;

    assert_eq!(registry.snapshot().playbook, vec![FileId(8)]);
    assert!(!fake.calls().contains(&Call::ListReferenceFiles { include_content: false }));
}

#[tokio::test]
async fn restore_session_signs_in_with_cookie_user() {
    let (fake, _, registry) = setup();
    *fake.session.borrow_mut() = Some(SessionInfo { session_id: "s-1".into(), user: test_user() });

    let user = registry.restore_session().await.unwrap();

    assert_eq!(user, Some(test_user()));
    assert_eq!(registry.user_email().as_deref(), Some("pm@example.com"));
}

#[tokio::test]
async fn restore_session_without_cookie_stays_signed_out() {
    let (fake, _, registry) = setup();
    assert_eq!(registry.restore_session().await.unwrap(), None);
    assert_eq!(registry.user_email(), None);
    assert_eq!(fake.calls(), vec![Call::CurrentSession]);
}

#[tokio::test]
async fn logout_drops_user_state_but_keeps_selections() {
    let (fake, _, registry) = signed_in().await;
    registry.set_playbook(vec![FileId(2)]);
    registry.push_local(Role::User, "hello");

    registry.logout().await;

    let state = registry.snapshot();
    assert_eq!(state.user, None);
    assert!(state.messages.is_empty());
    assert_eq!(state.active_chat_id, None);
    assert_eq!(state.playbook, vec![FileId(2)]);
    assert_eq!(fake.calls(), vec![Call::Logout]);
}

// =============================================================================
// Active chat and messages
// =============================================================================

#[test]
fn ensure_active_chat_is_idempotent() {
    let (_, _, registry) = setup();
    let first = registry.ensure_active_chat();
    assert_eq!(registry.ensure_active_chat(), first);
    assert_eq!(registry.active_chat_id(), Some(first));
}

#[tokio::test]
async fn append_message_persists_under_active_chat() {
    let (fake, _, registry) = signed_in().await;
    let chat_id = registry.ensure_active_chat();

    registry.append_message(Role::User, "status?").await;

    assert_eq!(
        fake.calls(),
        vec![Call::SaveMessage { chat_id, role: Role::User, message: "status?".into() }]
    );
}

#[tokio::test]
async fn failed_persist_keeps_local_append() {
    let (fake, _, registry) = signed_in().await;
    fake.reject_saves.set(true);

    registry.append_message(Role::User, "status?").await;

    let messages = registry.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "status?");
}

#[test]
fn label_prefers_first_user_message_then_preview() {
    let (_, _, registry) = setup();
    assert_eq!(registry.current_chat_label(), "New chat");

    registry.set_preview_if_empty("Roadmap review");
    assert_eq!(registry.current_chat_label(), "Roadmap review");

    registry.push_local(Role::Assistant, "Welcome");
    registry.push_local(Role::User, "   ");
    registry.push_local(Role::User, "What is blocking the release train?");
    assert_eq!(registry.current_chat_label(), "What is blocking the rele…");
}

#[test]
fn observer_runs_after_mutations() {
    let (_, _, registry) = setup();
    let count = Rc::new(Cell::new(0));
    let seen = Rc::clone(&count);
    registry.set_observer(move || seen.set(seen.get() + 1));

    registry.push_local(Role::User, "a");
    registry.set_typing(true);

    assert_eq!(count.get(), 2);
}

// =============================================================================
// load_history
// =============================================================================

#[tokio::test]
async fn load_history_replaces_messages_and_links_project() {
    let (fake, _, registry) = signed_in().await;
    let chat_id = ChatId::from("c1");
    fake.histories.borrow_mut().insert(
        chat_id.clone(),
        history(&[(Role::User, "plan?"), (Role::Assistant, "```md\nStep 1\n```")], Some(("p1", "Apollo"))),
    );
    *fake.projects.borrow_mut() = vec![project("p1", &[(1, "c1")])];
    registry.refresh_projects().await;
    registry.push_local(Role::User, "stale local message");

    registry.load_history(&chat_id).await.unwrap();

    let state = registry.snapshot();
    let texts: Vec<_> = state.messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, ["plan?", "Step 1"]);
    assert!(state.messages.iter().all(|m| m.timestamp > 0));
    assert_eq!(state.active_chat_id, Some(chat_id.clone()));
    assert_eq!(state.active_project_id, Some(ProjectId("p1".into())));
    assert_eq!(state.current_project.map(|p| p.name), Some("Apollo".to_owned()));
    assert_eq!(state.preview, "plan?");
    assert_eq!(state.projects[0].conversations[0].preview, "plan?");
    assert!(!state.loading_history);
    assert_eq!(fake.calls().last(), Some(&Call::ListSessions));
}

#[tokio::test]
async fn load_history_failure_leaves_state_untouched() {
    let (_, _, registry) = signed_in().await;
    registry.push_local(Role::User, "keep me");
    let before = registry.snapshot();

    let err = registry.load_history(&ChatId::from("missing")).await.unwrap_err();

    assert_eq!(err, ChatError::Server { status: Some(404), message: "Chat not found".into() });
    assert_eq!(registry.snapshot(), before);
}

#[tokio::test]
async fn load_history_requires_sign_in() {
    let (fake, _, registry) = setup();
    let err = registry.load_history(&ChatId::from("c1")).await.unwrap_err();
    assert!(matches!(err, ChatError::Validation(_)));
    assert!(fake.calls().is_empty());
}

// =============================================================================
// start_new_chat
// =============================================================================

#[tokio::test]
async fn start_new_chat_flushes_paired_transcript_first() {
    let (fake, _, registry) = signed_in().await;
    let old = registry.ensure_active_chat();
    registry.push_local(Role::User, "A");
    registry.push_local(Role::Assistant, "B");
    registry.push_local(Role::User, "C");

    let new = registry.start_new_chat().await;

    assert_ne!(new, old);
    let calls = fake.calls();
    let Call::SaveConversation { chat_id, json } = &calls[0] else {
        panic!("expected transcript save first, got {calls:?}");
    };
    assert_eq!(chat_id, &old);
    let value: serde_json::Value = serde_json::from_str(json).unwrap();
    assert_eq!(
        value["messages"],
        serde_json::json!([
            { "message_id": 1, "user": "A", "assistant": "B" },
            { "message_id": 2, "user": "C", "assistant": "" }
        ])
    );
    assert_eq!(&calls[1..], &[Call::CreateChat(new.clone()), Call::ListSessions]);

    let state = registry.snapshot();
    assert!(state.messages.is_empty());
    assert_eq!(state.active_chat_id, Some(new));
    assert!(state.preview.is_empty());
}

#[tokio::test]
async fn start_new_chat_with_empty_chat_skips_flush() {
    let (fake, _, registry) = signed_in().await;
    let new = registry.start_new_chat().await;
    assert_eq!(fake.calls(), vec![Call::CreateChat(new), Call::ListSessions]);
}

// =============================================================================
// Sidebar
// =============================================================================

#[tokio::test]
async fn sessions_sort_most_recent_first_and_fill_preview() {
    let (fake, _, registry) = signed_in().await;
    let active = registry.ensure_active_chat();
    *fake.sessions.borrow_mut() = vec![
        session("a", Some("2026-01-01T00:00:00")),
        session("b", None),
        session("c", Some("2026-03-01T00:00:00")),
        session("d", Some("2026-01-01T00:00:00")),
        session(active.as_str(), Some("2025-06-01T00:00:00")),
    ];

    registry.refresh_sessions().await;

    let state = registry.snapshot();
    let order: Vec<_> = state.sessions.iter().map(|s| s.chat_id.as_str().to_owned()).collect();
    assert_eq!(order, ["c", "a", "d", active.as_str(), "b"]);
    assert_eq!(state.preview, format!("preview {active}"));
}

#[tokio::test]
async fn failed_session_refresh_keeps_list() {
    let (fake, _, registry) = signed_in().await;
    *fake.sessions.borrow_mut() = vec![session("a", None)];
    registry.refresh_sessions().await;
    fake.offline.set(true);

    registry.refresh_sessions().await;

    assert_eq!(registry.snapshot().sessions.len(), 1);
}

#[tokio::test]
async fn refresh_projects_expands_first_with_conversations_once() {
    let (fake, _, registry) = signed_in().await;
    *fake.projects.borrow_mut() = vec![project("empty", &[]), project("p2", &[(1, "c1")]), project("p3", &[(2, "c2")])];

    registry.refresh_projects().await;
    let expanded: Vec<_> = registry.snapshot().expanded_projects.into_iter().collect();
    assert_eq!(expanded, vec![ProjectId("p2".into())]);

    registry.toggle_project_expanded(&ProjectId("p2".into()));
    registry.toggle_project_expanded(&ProjectId("p3".into()));
    registry.refresh_projects().await;
    let expanded: Vec<_> = registry.snapshot().expanded_projects.into_iter().collect();
    assert_eq!(expanded, vec![ProjectId("p3".into())]);
}

// =============================================================================
// Projects
// =============================================================================

fn created(id: &str, conversation_id: i64, chat: &str) -> CreatedProject {
    let project = project(id, &[(conversation_id, chat)]);
    let conversation = project.conversations[0].clone();
    CreatedProject { project, conversation }
}

#[tokio::test]
async fn create_project_goes_to_head_and_opens_conversation() {
    let (fake, _, registry) = signed_in().await;
    *fake.projects.borrow_mut() = vec![project("old", &[])];
    registry.refresh_projects().await;
    *fake.created_project.borrow_mut() = Some(created("new", 5, "c-new"));
    fake.histories
        .borrow_mut()
        .insert(ChatId::from("c-new"), history(&[], Some(("new", "Project new"))));

    let id = registry.create_project("  Apollo  ").await.unwrap();

    let state = registry.snapshot();
    assert_eq!(id, ProjectId("new".into()));
    assert_eq!(state.projects[0].id, id);
    assert_eq!(state.projects.len(), 2);
    assert!(state.expanded_projects.contains(&id));
    assert_eq!(state.active_project_id, Some(id));
    assert_eq!(state.active_conversation_id, Some(5));
    assert_eq!(state.active_chat_id, Some(ChatId::from("c-new")));
    assert!(fake.calls().contains(&Call::CreateProject("Apollo".into())));
}

#[tokio::test]
async fn blank_project_name_is_rejected_locally() {
    let (fake, _, registry) = signed_in().await;
    let err = registry.create_project("   ").await.unwrap_err();
    assert!(matches!(err, ChatError::Validation(_)));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn deleting_active_project_clears_pointers() {
    let (fake, _, registry) = signed_in().await;
    *fake.created_project.borrow_mut() = Some(created("p1", 5, "c1"));
    fake.histories.borrow_mut().insert(ChatId::from("c1"), history(&[], Some(("p1", "Project p1"))));
    let id = registry.create_project("Apollo").await.unwrap();
    fake.clear_calls();

    registry.delete_project(&id).await.unwrap();

    let state = registry.snapshot();
    assert_eq!(state.active_project_id, None);
    assert_eq!(state.active_conversation_id, None);
    assert_eq!(state.current_project, None);
    assert!(!state.expanded_projects.contains(&id));
    assert_eq!(fake.calls(), vec![Call::DeleteProject(id), Call::ListProjects]);
}

#[tokio::test]
async fn failed_delete_keeps_project() {
    let (fake, _, registry) = signed_in().await;
    *fake.projects.borrow_mut() = vec![project("p1", &[])];
    registry.refresh_projects().await;
    fake.reject_saves.set(true);

    assert!(registry.delete_project(&ProjectId("p1".into())).await.is_err());
    assert_eq!(registry.snapshot().projects.len(), 1);
}

#[tokio::test]
async fn select_conversation_loads_its_chat() {
    let (fake, _, registry) = signed_in().await;
    *fake.projects.borrow_mut() = vec![project("p1", &[(3, "c3")])];
    registry.refresh_projects().await;
    fake.histories
        .borrow_mut()
        .insert(ChatId::from("c3"), history(&[(Role::User, "hi")], Some(("p1", "Project p1"))));

    registry.select_conversation(&ProjectId("p1".into()), 3).await.unwrap();

    let state = registry.snapshot();
    assert_eq!(state.active_conversation_id, Some(3));
    assert_eq!(state.active_chat_id, Some(ChatId::from("c3")));

    let err = registry.select_conversation(&ProjectId("p1".into()), 99).await.unwrap_err();
    assert!(matches!(err, ChatError::Validation(_)));
}

// =============================================================================
// Repointing
// =============================================================================

#[tokio::test]
async fn repoint_rewrites_active_id_and_references() {
    let (fake, _, registry) = signed_in().await;
    let local = registry.ensure_active_chat();
    *fake.projects.borrow_mut() = vec![project("p1", &[(1, local.as_str())])];
    *fake.sessions.borrow_mut() = vec![session(local.as_str(), None)];
    registry.refresh_projects().await;
    registry.refresh_sessions().await;
    let server = ChatId::from("srv-9");

    registry.repoint_chat(&local, &server);

    let state = registry.snapshot();
    assert_eq!(state.active_chat_id, Some(server.clone()));
    assert_eq!(state.projects[0].conversations[0].chat_id, server);
    assert_eq!(state.sessions[0].chat_id, server);
}

#[test]
fn repoint_after_chat_switch_keeps_newer_active_id() {
    let (_, _, registry) = setup();
    let requested = ChatId::from("old");
    let switched = registry.ensure_active_chat();

    registry.repoint_chat(&requested, &ChatId::from("srv"));

    assert_eq!(registry.active_chat_id(), Some(switched));
}

// =============================================================================
// Context selection
// =============================================================================

#[test]
fn uploads_shadow_playbook_without_erasing_it() {
    let (_, store, registry) = setup();
    registry.set_playbook(vec![FileId(1)]);
    assert_eq!(registry.context_source(), ContextSource::Playbook(vec![FileId(1)]));

    registry.register_uploads(&[FileId(7), FileId(9)]);
    assert_eq!(registry.context_source(), ContextSource::UploadedFiles(vec![FileId(7), FileId(9)]));

    registry.clear_uploads();
    assert_eq!(registry.context_source(), ContextSource::Playbook(vec![FileId(1)]));
    assert_eq!(store.get(PLAYBOOK_KEY).as_deref(), Some("[1]"));

    registry.set_playbook(Vec::new());
    assert_eq!(registry.context_source(), ContextSource::None);
    assert_eq!(store.get(PLAYBOOK_KEY), None);
}

#[tokio::test]
async fn knowledge_base_toggle_round_trips_through_store() {
    let (fake, store, registry) = signed_in().await;

    assert!(registry.toggle_knowledge_base(FileId(6)).await.unwrap());
    assert_eq!(store.get(KNOWLEDGE_BASE_KEY).as_deref(), Some("[6]"));

    assert!(!registry.toggle_knowledge_base(FileId(6)).await.unwrap());
    assert_eq!(store.get(KNOWLEDGE_BASE_KEY), None);
    assert_eq!(
        fake.calls(),
        vec![Call::MarkKnowledgeBase(FileId(6)), Call::UnmarkKnowledgeBase(FileId(6))]
    );
}

#[tokio::test]
async fn failed_knowledge_base_toggle_changes_nothing() {
    let (fake, store, registry) = signed_in().await;
    fake.reject_saves.set(true);

    assert!(registry.toggle_knowledge_base(FileId(6)).await.is_err());
    assert!(registry.snapshot().knowledge_base.is_empty());
    assert_eq!(store.get(KNOWLEDGE_BASE_KEY), None);
}

#[tokio::test]
async fn deleting_reference_file_unmarks_it() {
    let (fake, store, registry) = signed_in().await;
    *fake.reference_files.borrow_mut() = vec![reference_file(6, "risks.pdf", "late")];
    registry.toggle_knowledge_base(FileId(6)).await.unwrap();

    registry.delete_reference_file(FileId(6)).await.unwrap();

    assert!(registry.snapshot().knowledge_base.is_empty());
    assert_eq!(store.get(KNOWLEDGE_BASE_KEY), None);
    assert!(fake.reference_files.borrow().is_empty());
}

#[test]
fn sort_sessions_is_stable_for_ties() {
    let mut sessions = vec![session("x", Some("2026-01-01T00:00:00")), session("y", Some("2026-01-01T00:00:00"))];
    sort_sessions(&mut sessions);
    assert_eq!(sessions[0].chat_id.as_str(), "x");
}
