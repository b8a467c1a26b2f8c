// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Mutex;
use tempfile::tempdir;

fn noop_interrupt() -> bool {
    false
}

fn request(dir: &std::path::Path, script: &str) -> InvokeRequest {
    InvokeRequest {
        command: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
        cwd: dir.to_path_buf(),
        env: vec![],
        no_output_timeout: Duration::from_secs(5),
        stream_log_path: dir.join("stream.jsonl"),
        max_console_stream_chars: 10_000,
        compaction_markers: DEFAULT_COMPACTION_MARKERS.iter().map(|s| s.to_string()).collect(),
    }
}

#[tokio::test]
async fn extracts_text_and_final_usage() {
    let dir = tempdir().unwrap();
    let script = r#"echo '{"type":"assistant","message":{"content":[{"type":"text","text":"hi there"}]}}'; echo '{"type":"result","modelUsage":{"claude":{"inputTokens":10,"cacheCreationInputTokens":2,"cacheReadInputTokens":1,"outputTokens":5,"contextWindow":200000}},"session_id":"abc123"}'"#;

    let collected = Mutex::new(String::new());
    let on_output = |s: &str| collected.lock().unwrap().push_str(s);

    let outcome = ProcessInvoker
        .invoke(request(dir.path(), script), &on_output, &noop_interrupt)
        .await
        .unwrap();

    assert_eq!(outcome.exit_code, Some(0));
    assert!(!outcome.timed_out);
    assert_eq!(outcome.input_tokens, 13);
    assert_eq!(outcome.output_tokens, 5);
    assert_eq!(outcome.context_window, Some(200_000));
    assert_eq!(outcome.session_id.as_deref(), Some("abc123"));
    assert!(collected.lock().unwrap().contains("hi there"));

    let logged = std::fs::read_to_string(dir.path().join("stream.jsonl")).unwrap();
    assert!(logged.contains("hi there"));
    assert!(logged.contains("modelUsage"));
}

#[tokio::test]
async fn detects_compaction_marker() {
    let dir = tempdir().unwrap();
    let script = r#"echo '{"type":"system","text":"context window nearing limit, auto-compact triggered"}'"#;
    let on_output = |_: &str| {};

    let outcome = ProcessInvoker
        .invoke(request(dir.path(), script), &on_output, &noop_interrupt)
        .await
        .unwrap();

    assert!(outcome.compaction_detected);
}

#[tokio::test]
async fn respects_console_stream_char_cap() {
    let dir = tempdir().unwrap();
    let script = r#"echo '{"type":"assistant","text":"0123456789"}'"#;
    let mut req = request(dir.path(), script);
    req.max_console_stream_chars = 4;

    let collected = Mutex::new(String::new());
    let on_output = |s: &str| collected.lock().unwrap().push_str(s);

    let outcome = ProcessInvoker
        .invoke(req, &on_output, &noop_interrupt)
        .await
        .unwrap();

    assert_eq!(outcome.displayed_chars, 4);
    assert_eq!(collected.lock().unwrap().as_str(), "0123");
    assert!(outcome.hidden_chars > 0);
}

#[tokio::test]
async fn no_output_timeout_kills_child() {
    let dir = tempdir().unwrap();
    let mut req = request(dir.path(), "sleep 10");
    req.no_output_timeout = Duration::from_millis(500);
    let on_output = |_: &str| {};

    let outcome = ProcessInvoker
        .invoke(req, &on_output, &noop_interrupt)
        .await
        .unwrap();

    assert!(outcome.timed_out);
}

#[tokio::test]
async fn unknown_binary_is_not_found() {
    let dir = tempdir().unwrap();
    let req = InvokeRequest {
        command: vec!["definitely-not-a-real-binary-xyz".to_string()],
        ..request(dir.path(), "true")
    };
    let on_output = |_: &str| {};

    let err = ProcessInvoker.invoke(req, &on_output, &noop_interrupt).await.unwrap_err();
    assert!(matches!(err, InvokeError::NotFound(_)));
}

#[tokio::test]
async fn fake_invoker_returns_queued_outcome_and_records_call() {
    use crate::invoker::fake::FakeInvoker;

    let fake = FakeInvoker::new();
    fake.push_outcome(InvokeOutcome {
        input_tokens: 42,
        ..Default::default()
    });

    let dir = tempdir().unwrap();
    let on_output = |_: &str| {};
    let outcome = fake.invoke(request(dir.path(), "true"), &on_output, &noop_interrupt).await.unwrap();

    assert_eq!(outcome.input_tokens, 42);
    assert_eq!(fake.calls.lock().len(), 1);
}
