use super::*;

// =============================================================
// context_label
// =============================================================

#[test]
fn context_label_names_each_source() {
    assert_eq!(
        context_label(&ContextSource::UploadedFiles(vec![FileId(3)])),
        "Answering from your uploaded file"
    );
    assert_eq!(
        context_label(&ContextSource::Playbook(vec![FileId(1), FileId(2)])),
        "Answering from the project playbook (2 files)"
    );
    assert_eq!(context_label(&ContextSource::None), "Answering from the general knowledge base");
}

#[test]
fn context_label_follows_registry_precedence() {
    let state = RegistryState {
        uploaded_files: vec![FileId(9)],
        playbook: vec![FileId(1)],
        ..RegistryState::default()
    };
    assert_eq!(context_label(&state.context_source()), "Answering from your uploaded file");
}

// =============================================================
// is_active_chat
// =============================================================

#[test]
fn is_active_chat_matches_only_active_id() {
    let state = RegistryState { active_chat_id: Some(ChatId::from("a")), ..RegistryState::default() };
    assert!(is_active_chat(&state, &ChatId::from("a")));
    assert!(!is_active_chat(&state, &ChatId::from("b")));
}

#[test]
fn is_active_chat_false_without_chat() {
    assert!(!is_active_chat(&RegistryState::default(), &ChatId::from("a")));
}

#[test]
fn auth_phase_starts_loading() {
    assert_eq!(AuthPhase::default(), AuthPhase::Loading);
}
