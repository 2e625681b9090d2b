//! Integration tests driving the `wlog` binary end to end.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const SESSION: &str = r#"{
  "header_records": {"starttime": 0, "endtime": 2000},
  "text_records": {"0": "", "500": "a", "1200": "ab", "1500": "a"},
  "cursor_records": {"500": "1:1", "1200": "2:2", "1500": "1:1"},
  "key_records": {
    "500": "keydown: a",
    "1200": "keydown: b",
    "1500": "keydown: Backspace"
  },
  "scroll_records": {"100": "0:0"}
}"#;

fn wlog_binary() -> String {
    env!("CARGO_BIN_EXE_wlog").to_string()
}

/// Writes the sample session into `dir` and returns its path.
fn write_session(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("session.json");
    std::fs::write(&path, SESSION).unwrap();
    path
}

/// Runs `wlog` with an isolated HOME so no user config leaks in.
fn wlog(home: &Path, args: &[&str]) -> Output {
    Command::new(wlog_binary())
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run wlog")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "wlog failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn test_linearize_prints_stream_and_status() {
    let temp = TempDir::new().unwrap();
    let log = write_session(temp.path());
    let out = stdout(&wlog(temp.path(), &["linearize", log.to_str().unwrap()]));
    assert_eq!(
        out,
        "<START><0.50>a<0.70>b<0.30><DELETE><0.50><END>\nkeys: 3 | cursor: 3 | tokens: 9 | mismatches: 0 | pause>=0.00s\n"
    );
}

#[test]
fn test_pause_threshold_flag_overrides_config() {
    let temp = TempDir::new().unwrap();
    let log = write_session(temp.path());
    let config = temp.path().join("wlog.toml");
    std::fs::write(&config, "pause_threshold_seconds = 10.0\n").unwrap();

    let from_config = stdout(&wlog(
        temp.path(),
        &["-c", config.to_str().unwrap(), "linearize", log.to_str().unwrap()],
    ));
    assert!(from_config.starts_with("<START>ab<DELETE><END>\n"));

    let from_flag = stdout(&wlog(
        temp.path(),
        &[
            "-c",
            config.to_str().unwrap(),
            "linearize",
            log.to_str().unwrap(),
            "--pause-threshold",
            "0.6",
        ],
    ));
    assert!(from_flag.starts_with("<START>a<0.70>b<DELETE><END>\n"));
}

#[test]
fn test_linearize_json_reads_stdin() {
    let temp = TempDir::new().unwrap();
    let mut child = Command::new(wlog_binary())
        .env("HOME", temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join(".config"))
        .args(["linearize", "-", "--json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(SESSION.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["mismatches"], 0);
    assert_eq!(value["tokens"][0]["type"], "marker");
    assert_eq!(value["tokens"][2]["type"], "text");
    assert_eq!(value["tokens"][2]["value"], "a");
}

#[test]
fn test_measures_json_for_two_logs() {
    let temp = TempDir::new().unwrap();
    let log = write_session(temp.path());
    let empty = temp.path().join("empty.json");
    std::fs::write(&empty, "{}").unwrap();

    let out = stdout(&wlog(
        temp.path(),
        &["measures", log.to_str().unwrap(), empty.to_str().unwrap(), "--json"],
    ));
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value[0]["measures"]["writing_time_ms"], 1500.0);
    assert_eq!(value[0]["measures"]["deleted_characters"], 1.0);
    assert_eq!(
        value[1]["measures"]["status"],
        "no text records: measures unavailable"
    );
    assert!(value[1]["measures"]["writing_time_ms"].is_null());
}

#[test]
fn test_export_writes_all_sections_to_file() {
    let temp = TempDir::new().unwrap();
    let log = write_session(temp.path());
    let target = temp.path().join("export.txt");

    let output = wlog(
        temp.path(),
        &[
            "export",
            log.to_str().unwrap(),
            "--id",
            "n1",
            "--title",
            "Draft",
            "-o",
            target.to_str().unwrap(),
        ],
    );
    assert!(output.status.success());

    let text = std::fs::read_to_string(&target).unwrap();
    assert!(text.starts_with("noteId: n1\ntitle: Draft\nexportedAt: "));
    assert!(text.contains("\nexporter: wlog-diffs-v1\n[diffs]\n0 0 0 \n0 0 1 (1,\"a\")\nCURSOR 1\n"));
    for section in ["[linear_debug]", "[linear_steps]", "[logs]"] {
        assert!(text.contains(section), "missing {section}");
    }
}

#[test]
fn test_keys_counts_revisions_replay_and_final_text() {
    let temp = TempDir::new().unwrap();
    let log = write_session(temp.path());
    let path = log.to_str().unwrap();

    assert_eq!(
        stdout(&wlog(temp.path(), &["keys", path, "--pause-threshold", "0.4"])),
        "a<0.70>b<DELETE>\n"
    );

    let counts = stdout(&wlog(temp.path(), &["counts", path]));
    assert!(counts.starts_with("Recording time: 2.00\nCounts (process):\nCharacters | Total: 2\n"));

    let revisions = stdout(&wlog(temp.path(), &["revisions", path]));
    assert_eq!(revisions, "1200-1500 (300ms) insert\n1500-2000 (500ms) delete\n");

    let frame: serde_json::Value =
        serde_json::from_str(&stdout(&wlog(temp.path(), &["replay", path, "--at", "1300"])))
            .unwrap();
    assert_eq!(frame["text"], "ab");
    assert_eq!(frame["cursor"], 2);
    assert_eq!(frame["scroll_top"], 0);

    assert_eq!(stdout(&wlog(temp.path(), &["final-text", path])), "a\n");
}

#[test]
fn test_missing_log_fails_with_context() {
    let temp = TempDir::new().unwrap();
    let output = wlog(temp.path(), &["linearize", "/nonexistent/session.json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to open log /nonexistent/session.json"));
}
