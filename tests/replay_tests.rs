// Replaying recorded event streams end to end

use richtrace::config::Settings;
use richtrace::error::{HookError, ReplayError};
use richtrace::hooks::RunConfig;
use richtrace::term::{Console, ConsoleOptions};
use richtrace::time::ManualClock;
use richtrace::{ExitStatus, Tracer, replay};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::PathBuf;
use tempfile::TempDir;

const SESSION: &str = r#"{"event":"session_start","session":{"session_id":"s1","rootdir":"/srv/project","platform":"linux","framework":"pytest-8.3.2"}}"#;

fn tracer(rich: bool) -> Tracer {
    Tracer::new(
        RunConfig::new(Settings::default(), "/srv/project"),
        Console::buffer(ConsoleOptions {
            width: 80,
            ..ConsoleOptions::default()
        }),
        Box::new(ManualClock::new()),
        rich,
    )
}

fn stream(events: &[&str]) -> String {
    let mut text = String::from(SESSION);
    text.push('\n');
    for event in events {
        text.push_str(event);
        text.push('\n');
    }
    text
}

#[test]
fn test_replay_failed_run_from_file() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");
    std::fs::write(
        &path,
        stream(&[
            r#"{"event":"collection_start","session_id":"s1"}"#,
            r#"{"event":"item_collected","item":{"node_id":"tests/test_a.py::test_ok"}}"#,
            r#"{"event":"item_collected","item":{"node_id":"tests/test_a.py::test_bad"}}"#,
            r#"{"event":"collection_finish"}"#,
            r#"{"event":"test_report","report":{"node_id":"tests/test_a.py::test_ok","phase":"call","outcome":"passed"}}"#,
            r#"{"event":"exception_interact","call":{"phase":"call","exception":{"type_name":"AssertionError","message":"assert 1 == 2","frames":[{"path":"/srv/project/tests/test_a.py","lineno":9,"function":"test_bad"}]}},"report":{"node_id":"tests/test_a.py::test_bad","phase":"call","outcome":"failed"}}"#,
            r#"{"event":"test_report","report":{"node_id":"tests/test_a.py::test_bad","phase":"call","outcome":"failed"}}"#,
            r#"{"event":"session_finish"}"#,
        ]),
    )
    .unwrap();
    let mut tracer = tracer(true);

    // Act
    let status = replay(BufReader::new(File::open(&path).unwrap()), &mut tracer).unwrap();

    // Assert
    assert_eq!(status, ExitStatus::TestsFailed);
    assert_eq!(status.code(), 1);
    let out = tracer.console().contents();
    assert!(out.contains(" test session starts "));
    assert!(out.contains(" FAILURES "));
    assert!(out.contains("AssertionError: assert 1 == 2"));
    assert!(out.contains("tests/test_a.py:9"));
    assert!(out.contains("1 failed, 1 passed in "));
}

#[test]
fn test_replay_collect_only_without_items() {
    let text = r#"{"event":"session_start","session":{"rootdir":"/srv/project","collect_only":true}}
{"event":"collection_start"}
{"event":"collection_finish"}
{"event":"session_finish"}
"#;
    let mut tracer = tracer(true);

    let status = replay(Cursor::new(text), &mut tracer).unwrap();

    assert_eq!(status, ExitStatus::NoTestsCollected);
    assert_eq!(status.code(), 5);
    assert!(tracer.console().contents().contains("no tests collected in "));
}

#[test]
fn test_replay_interrupted_run() {
    let text = stream(&[
        r#"{"event":"collection_start"}"#,
        r#"{"event":"item_collected","item":{"node_id":"t.py::a"}}"#,
        r#"{"event":"collection_finish"}"#,
        r#"{"event":"interrupted"}"#,
        r#"{"event":"session_finish"}"#,
    ]);
    let mut tracer = tracer(true);

    let status = replay(Cursor::new(text), &mut tracer).unwrap();

    assert_eq!(status.code(), 2);
    assert!(tracer.console().contents().contains("KeyboardInterrupt"));
}

#[test]
fn test_replay_honors_host_exit_status() {
    let text = stream(&[
        r#"{"event":"collection_start"}"#,
        r#"{"event":"item_collected","item":{"node_id":"t.py::a"}}"#,
        r#"{"event":"collection_finish"}"#,
        r#"{"event":"test_report","report":{"node_id":"t.py::a","phase":"call","outcome":"passed"}}"#,
        r#"{"event":"session_finish","exit_status":"usage_error"}"#,
    ]);
    let mut tracer = tracer(true);

    let status = replay(Cursor::new(text), &mut tracer).unwrap();

    assert_eq!(status, ExitStatus::UsageError);
}

#[test]
fn test_replay_reports_malformed_line() {
    let text = format!("{}\n\n{{\"event\":\"collection_start\"\n", SESSION);
    let mut tracer = tracer(true);

    let err = replay(Cursor::new(text), &mut tracer).unwrap_err();

    assert!(matches!(err, ReplayError::Decode { line: 3, .. }));
    assert!(err.to_string().starts_with("line 3: malformed event"));
}

#[test]
fn test_replay_without_session_finish_still_summarizes() {
    let text = stream(&[
        r#"{"event":"collection_start"}"#,
        r#"{"event":"item_collected","item":{"node_id":"t.py::a"}}"#,
        r#"{"event":"collection_finish"}"#,
        r#"{"event":"test_report","report":{"node_id":"t.py::a","phase":"call","outcome":"passed"}}"#,
    ]);
    let mut tracer = tracer(true);

    let status = replay(Cursor::new(text), &mut tracer).unwrap();

    assert_eq!(status, ExitStatus::Ok);
    assert!(tracer.console().contents().contains("1 passed in "));
}

#[test]
fn test_plain_mode_has_no_rich_sections() {
    let text = stream(&[
        r#"{"event":"collection_start"}"#,
        r#"{"event":"item_collected","item":{"node_id":"t.py::a"}}"#,
        r#"{"event":"collection_finish"}"#,
        r#"{"event":"test_report","report":{"node_id":"t.py::a","phase":"call","outcome":"passed"}}"#,
        r#"{"event":"session_finish"}"#,
    ]);
    let mut tracer = tracer(false);

    let status = replay(Cursor::new(text), &mut tracer).unwrap();

    assert_eq!(status, ExitStatus::Ok);
    let out = tracer.console().contents();
    assert!(!out.contains(" test session starts "));
    assert!(out.contains("1 passed"));
}

#[test]
fn test_failure_inside_library_code_still_summarizes() {
    // Arrange
    let text = stream(&[
        r#"{"event":"collection_start"}"#,
        r#"{"event":"item_collected","item":{"node_id":"tests/test_a.py::test_load"}}"#,
        r#"{"event":"collection_finish"}"#,
        r#"{"event":"exception_interact","call":{"phase":"call","exception":{"type_name":"JSONDecodeError","message":"Expecting value","frames":[{"path":"/srv/project/tests/test_a.py","lineno":5,"function":"test_load"},{"path":"/usr/lib/python3.12/json/__init__.py","lineno":346,"function":"loads"},{"path":"/usr/lib/python3.12/json/decoder.py","lineno":355,"function":"raw_decode"}]}},"report":{"node_id":"tests/test_a.py::test_load","phase":"call","outcome":"failed"}}"#,
        r#"{"event":"test_report","report":{"node_id":"tests/test_a.py::test_load","phase":"call","outcome":"failed"}}"#,
        r#"{"event":"session_finish"}"#,
    ]);
    let mut tracer = tracer(true);

    // Act
    let status = replay(Cursor::new(text), &mut tracer).unwrap();

    // Assert
    assert_eq!(status, ExitStatus::TestsFailed);
    let out = tracer.console().contents();
    assert!(out.contains(" FAILURES "));
    assert!(out.contains("at tests/test_a.py:5"));
    assert!(out.contains("1 failed in "));
}

#[test]
fn test_crash_with_no_frame_under_root_is_a_hook_error() {
    let text = stream(&[
        r#"{"event":"collection_start"}"#,
        r#"{"event":"collect_error","exception":{"type_name":"ImportError","message":"bad","frames":[{"path":"/opt/elsewhere/plugin.py","lineno":3}]},"report":{"node_id":"tests/test_a.py","outcome":"failed"}}"#,
        r#"{"event":"collection_finish"}"#,
        r#"{"event":"session_finish"}"#,
    ]);
    let mut tracer = tracer(true);

    let err = replay(Cursor::new(text), &mut tracer).unwrap_err();

    match err {
        ReplayError::Hook(HookError::Path(path_err)) => {
            assert_eq!(path_err.path, PathBuf::from("/opt/elsewhere/plugin.py"));
            assert_eq!(path_err.root, PathBuf::from("/srv/project"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_trailing_garbage_after_finish_is_ignored() {
    let text = stream(&[
        r#"{"event":"collection_start"}"#,
        r#"{"event":"item_collected","item":{"node_id":"t.py::a"}}"#,
        r#"{"event":"collection_finish"}"#,
        r#"{"event":"test_report","report":{"node_id":"t.py::a","phase":"call","outcome":"passed"}}"#,
        r#"{"event":"session_finish"}"#,
        "not json at all",
    ]);
    let mut tracer = tracer(true);

    let status = replay(Cursor::new(text), &mut tracer).unwrap();

    assert_eq!(status, ExitStatus::Ok);
}
