use super::*;

// =============================================================================
// ARGUMENTS
// =============================================================================

#[test]
fn ask_joins_question_words_and_collects_files() {
    let cli = Cli::try_parse_from([
        "portal-chat",
        "--email",
        "pm@example.com",
        "ask",
        "--file",
        "a.pdf",
        "--file",
        "b.docx",
        "what",
        "next?",
    ])
    .unwrap();
    let Command::Ask(args) = &cli.command else {
        panic!("expected ask");
    };
    assert_eq!(args.question.join(" "), "what next?");
    assert_eq!(args.files, vec![PathBuf::from("a.pdf"), PathBuf::from("b.docx")]);
    assert!(args.chat.is_none());
}

#[test]
fn ask_requires_a_question() {
    assert!(Cli::try_parse_from(["portal-chat", "ask"]).is_err());
}

#[test]
fn flags_flow_into_portal_config() {
    let cli = Cli::try_parse_from([
        "portal-chat",
        "--base-url",
        "https://portal.example.com/",
        "--max-upload-files",
        "3",
        "--request-timeout-secs",
        "30",
        "sessions",
    ])
    .unwrap();
    let config = cli.portal_config().unwrap();
    assert_eq!(config.base_url, "https://portal.example.com");
    assert_eq!(config.max_upload_files, 3);
    assert_eq!(config.timeouts.request_secs, 30);
    assert_eq!(config.timeouts.connect_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    assert_eq!(config.playbook_question, DEFAULT_PLAYBOOK_QUESTION);
}

#[test]
fn file_download_needs_output_path() {
    assert!(Cli::try_parse_from(["portal-chat", "file", "download", "7"]).is_err());
    let cli = Cli::try_parse_from(["portal-chat", "file", "download", "7", "--out", "x.pdf"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::File(FileCommand { command: FileSubcommand::Download { file_id: 7, .. } })
    ));
}

#[test]
fn user_requires_non_blank_email() {
    let cli = Cli::try_parse_from(["portal-chat", "--email", "  ", "sessions"]).unwrap();
    assert!(matches!(cli.user(), Err(CliError::MissingEmail)));

    let cli = Cli::try_parse_from(["portal-chat", "--email", "pm@example.com", "--name", "Pat", "sessions"]).unwrap();
    let user = cli.user().unwrap();
    assert_eq!(user.email, "pm@example.com");
    assert_eq!(user.name, "Pat");
}

// =============================================================================
// REPL
// =============================================================================

#[test]
fn repl_commands_are_recognized() {
    assert_eq!(parse_repl_line("   "), ReplInput::Empty);
    assert_eq!(parse_repl_line("/quit"), ReplInput::Quit);
    assert_eq!(parse_repl_line("/exit"), ReplInput::Quit);
    assert_eq!(parse_repl_line("/new"), ReplInput::NewChat);
    assert_eq!(parse_repl_line("/start"), ReplInput::StartProject);
    assert_eq!(
        parse_repl_line("/upload a.pdf b.txt"),
        ReplInput::Upload(vec![PathBuf::from("a.pdf"), PathBuf::from("b.txt")])
    );
}

#[test]
fn repl_upload_without_paths_is_ignored() {
    assert_eq!(parse_repl_line("/upload"), ReplInput::Empty);
}

#[test]
fn repl_plain_text_is_a_question() {
    assert_eq!(parse_repl_line("  how do I scope? "), ReplInput::Ask("how do I scope?".to_owned()));
    assert_eq!(parse_repl_line("/unknown thing"), ReplInput::Ask("/unknown thing".to_owned()));
}

// =============================================================================
// OUTPUT
// =============================================================================

#[test]
fn terminal_text_turns_breaks_into_newlines() {
    assert_eq!(terminal_text("one<br/>two<br/>"), "one\ntwo\n");
}

#[test]
fn role_labels() {
    assert_eq!(role_label(Role::User), "you");
    assert_eq!(role_label(Role::Assistant), "assistant");
}
