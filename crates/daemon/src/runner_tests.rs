use super::*;
use minion_store::{NewTask, RegisterInput};
use std::path::PathBuf;
use tempfile::tempdir;

fn open_store() -> (tempfile::TempDir, Store) {
    let dir = tempdir().expect("tempdir");
    let store = Store::open(dir.path().join("minion.db")).expect("open store");
    (dir, store)
}

fn test_config(work_dir: PathBuf) -> RunnerConfig {
    RunnerConfig {
        agent: "coder-1".to_string(),
        db_path: work_dir.join("minion.db"),
        docs_dir: work_dir.join("docs"),
        log_dir: work_dir.join("logs"),
        work_dir,
        provider_bin: "echo".to_string(),
        model: None,
        poll_interval_s: 1,
        poll_timeout_s: 1,
        no_output_timeout: Duration::from_secs(1),
        max_console_stream_chars: 1_000,
    }
}

fn register_lead_and_coder(store: &Store) {
    store
        .register_agent(RegisterInput {
            name: "lead-1",
            class: "lead",
            model: None,
            description: None,
            transport: "daemon",
            crew: None,
        })
        .expect("register lead");
    store
        .register_agent(RegisterInput {
            name: "coder-1",
            class: "coder",
            model: None,
            description: None,
            transport: "daemon",
            crew: None,
        })
        .expect("register coder");
}

#[test]
fn backoff_grows_and_caps_at_max() {
    assert_eq!(backoff_secs(0), 1);
    assert_eq!(backoff_secs(1), 2);
    assert_eq!(backoff_secs(3), 8);
    assert_eq!(backoff_secs(20), MAX_BACKOFF_SECS);
}

#[test]
fn handle_result_phoenix_downs_below_threshold_and_alerts_lead() {
    let (dir, store) = open_store();
    register_lead_and_coder(&store);
    let cfg = test_config(dir.path().to_path_buf());

    let mut state = GenerationState {
        context_window: 1000,
        ..Default::default()
    };
    let outcome = InvokeOutcome {
        input_tokens: 990,
        output_tokens: 5,
        context_window: Some(1000),
        ..Default::default()
    };
    let poll_result = poll::PollResult {
        exit_code: poll::ExitCode::Content,
        signal: None,
        messages: None,
        tasks: Vec::new(),
        transport_hint: None,
    };

    let exit = handle_result(&cfg, &store, &mut state, &outcome, &poll_result, 1).expect("handle_result");
    assert!(matches!(exit, Some(GenerationExit::PhoenixDown)));

    let agent = store.get_agent("coder-1").expect("get").expect("present");
    assert_eq!(agent.status, "phoenix_down");
    assert_eq!(store.unread_direct_count("lead-1").expect("unread"), 1);
}

#[test]
fn handle_result_records_timeout_backoff_without_phoenix_down() {
    let (dir, store) = open_store();
    register_lead_and_coder(&store);
    let cfg = test_config(dir.path().to_path_buf());

    let mut state = GenerationState {
        context_window: 1000,
        ..Default::default()
    };
    let outcome = InvokeOutcome {
        timed_out: true,
        ..Default::default()
    };
    let poll_result = poll::PollResult {
        exit_code: poll::ExitCode::Content,
        signal: None,
        messages: None,
        tasks: Vec::new(),
        transport_hint: None,
    };

    let exit = handle_result(&cfg, &store, &mut state, &outcome, &poll_result, 1).expect("handle_result");
    assert!(exit.is_none());
    assert_eq!(state.consecutive_timeouts, 1);
    // No alert yet below TIMEOUTS_BEFORE_ALERT.
    assert_eq!(store.unread_direct_count("lead-1").expect("unread"), 0);
}

#[test]
fn handle_result_alerts_lead_after_repeated_timeouts() {
    let (dir, store) = open_store();
    register_lead_and_coder(&store);
    let cfg = test_config(dir.path().to_path_buf());

    let mut state = GenerationState {
        context_window: 1000,
        consecutive_timeouts: TIMEOUTS_BEFORE_ALERT - 1,
        ..Default::default()
    };
    let outcome = InvokeOutcome {
        timed_out: true,
        ..Default::default()
    };
    let poll_result = poll::PollResult {
        exit_code: poll::ExitCode::Content,
        signal: None,
        messages: None,
        tasks: Vec::new(),
        transport_hint: None,
    };

    handle_result(&cfg, &store, &mut state, &outcome, &poll_result, 1).expect("handle_result");
    assert_eq!(state.consecutive_timeouts, TIMEOUTS_BEFORE_ALERT);
    assert_eq!(store.unread_direct_count("lead-1").expect("unread"), 1);
}

#[test]
fn standdown_alerts_lead_only_on_first_call() {
    let (dir, store) = open_store();
    register_lead_and_coder(&store);
    let cfg = test_config(dir.path().to_path_buf());
    let mut state = GenerationState::default();

    standdown(&cfg, &store, &mut state).expect("standdown");
    standdown(&cfg, &store, &mut state).expect("standdown again");

    assert_eq!(store.unread_direct_count("lead-1").expect("unread"), 1);
    let agent = store.get_agent("coder-1").expect("get").expect("present");
    assert_eq!(agent.status, "stood_down");
}

#[test]
fn wake_from_standdown_keeps_session_for_same_task() {
    let (dir, store) = open_store();
    register_lead_and_coder(&store);
    let task = store
        .create_task(NewTask {
            title: "fix bug",
            task_file: "tasks/1.md",
            project: None,
            zone: None,
            blocked_by: "",
            created_by: "lead-1",
            class_required: Some("coder"),
            flow_type: "task",
            task_type: "feature",
            requirement_id: None,
        })
        .expect("create task");

    let mut state = GenerationState {
        stood_down: true,
        last_task_id: Some(task.id),
        resume_session_id: Some("sess-1".to_string()),
        ..Default::default()
    };
    let poll_result = poll::PollResult {
        exit_code: poll::ExitCode::Content,
        signal: None,
        messages: None,
        tasks: vec![task],
        transport_hint: None,
    };

    wake_from_standdown(&mut state, &poll_result);
    assert!(!state.stood_down);
    assert_eq!(state.resume_session_id.as_deref(), Some("sess-1"));
}

#[test]
fn wake_from_standdown_clears_session_for_a_different_task() {
    let mut state = GenerationState {
        stood_down: true,
        last_task_id: Some(1),
        resume_session_id: Some("sess-1".to_string()),
        ..Default::default()
    };
    let poll_result = poll::PollResult {
        exit_code: poll::ExitCode::Content,
        signal: None,
        messages: None,
        tasks: Vec::new(),
        transport_hint: None,
    };

    wake_from_standdown(&mut state, &poll_result);
    assert!(!state.stood_down);
    assert!(state.resume_session_id.is_none());
}
