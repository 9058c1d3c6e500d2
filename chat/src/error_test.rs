use super::*;

// =============================================================
// Codes
// =============================================================

#[test]
fn every_variant_has_a_distinct_code() {
    let errors = [
        ChatError::Transport("x".into()),
        ChatError::server(None, None),
        ChatError::Validation("x".into()),
        ChatError::Content("x".into()),
        ChatError::Decode("x".into()),
        ChatError::Config(ConfigError::Empty { key: "K".into() }),
    ];
    let mut codes: Vec<_> = errors.iter().map(ErrorCode::error_code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn config_codes() {
    let parse = ConfigError::Parse { key: "K".into(), value: "v".into() };
    assert_eq!(parse.error_code(), "E_CONFIG_PARSE");
    assert!(!parse.retryable());
}

// =============================================================
// Retryable
// =============================================================

#[test]
fn transport_and_decode_are_retryable() {
    assert!(ChatError::Transport("timeout".into()).retryable());
    assert!(ChatError::Decode("eof".into()).retryable());
}

#[test]
fn server_retryable_only_for_throttle_and_5xx() {
    assert!(ChatError::server(Some(503), None).retryable());
    assert!(ChatError::server(Some(429), None).retryable());
    assert!(!ChatError::server(Some(404), None).retryable());
    assert!(!ChatError::server(None, Some("nope".into())).retryable());
}

#[test]
fn validation_and_content_are_not_retryable() {
    assert!(!ChatError::Validation("too many".into()).retryable());
    assert!(!ChatError::Content("empty".into()).retryable());
}

// =============================================================
// Display
// =============================================================

#[test]
fn server_message_defaults_from_status() {
    assert_eq!(ChatError::server(Some(500), None).to_string(), "request failed: 500");
    assert_eq!(ChatError::server(None, None).to_string(), "request failed");
    assert_eq!(ChatError::server(Some(200), Some("bad id".into())).to_string(), "bad id");
}

#[test]
fn transport_displays_raw_message() {
    assert_eq!(ChatError::Transport("connection refused".into()).to_string(), "connection refused");
}

#[test]
fn config_error_converts() {
    let err: ChatError = ConfigError::Empty { key: "PORTAL_API_URL".into() }.into();
    assert_eq!(err.to_string(), "PORTAL_API_URL must not be empty");
}
