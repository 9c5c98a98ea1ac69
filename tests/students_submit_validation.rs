use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value.get("error").cloned().expect("error object")
}

fn open_with_subjects(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &Path,
    names: &[&str],
) {
    let _ = request_ok(
        stdin,
        reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    for (i, name) in names.iter().enumerate() {
        let _ = request_ok(stdin, reader, &format!("add{i}"), "subjects.add", json!({}));
        let _ = request_ok(
            stdin,
            reader,
            &format!("ren{i}"),
            "subjects.rename",
            json!({ "index": i, "name": name }),
        );
    }
}

#[test]
fn submit_derives_total_percentage_status_and_remark() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_with_subjects(&mut stdin, &mut reader, workspace.path(), &["Math", "Science"]);

    let alice = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.submit",
        json!({ "name": "  Alice  ", "marks": ["90", "80"] }),
    );
    assert_eq!(alice["clearForm"], true);
    assert_eq!(alice["index"], 0);
    let student = &alice["student"];
    assert_eq!(student["name"], "Alice");
    assert_eq!(student["marks"], json!([90, 80]));
    assert_eq!(student["total"], 170);
    let pct = student["percentage"].as_f64().expect("percentage");
    assert!((pct - 85.0).abs() < 1e-9);
    assert_eq!(student["status"], "Pass");
    assert_eq!(student["remarks"], "Excellent");

    let row = &alice["rows"][0];
    assert_eq!(row["percentageText"], "85.00%");
    assert_eq!(row["statusClass"], "pass");

    // Numbers are read like form text.
    let bob = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.submit",
        json!({ "name": "Bob", "marks": [20, 60.7] }),
    );
    assert_eq!(bob["student"]["marks"], json!([20, 60]));
    assert_eq!(bob["student"]["status"], "Fail");
    assert_eq!(bob["student"]["remarks"], "Needs Improvement");
    assert_eq!(bob["rows"].as_array().map(|a| a.len()), Some(2));
}

#[test]
fn duplicate_or_blank_name_is_rejected_without_checking_marks() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_with_subjects(&mut stdin, &mut reader, workspace.path(), &["Math"]);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.submit",
        json!({ "name": "Alice", "marks": ["50"] }),
    );

    for (i, name) in ["Alice", " Alice ", "", "   "].iter().enumerate() {
        let error = request_err(
            &mut stdin,
            &mut reader,
            &format!("dup{i}"),
            "students.submit",
            json!({ "name": name, "marks": ["not a mark"] }),
        );
        assert_eq!(error["code"], "invalid_name");
        assert_eq!(error["message"], "Invalid or duplicate name");
        assert!(error.get("details").is_none());
    }

    let listed = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(listed["students"].as_array().map(|a| a.len()), Some(1));
}

#[test]
fn any_bad_mark_aborts_whole_submission() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_with_subjects(
        &mut stdin,
        &mut reader,
        workspace.path(),
        &["Math", "Science", "Art"],
    );

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "students.submit",
        json!({ "name": "Carol", "marks": ["70", "101", "x"] }),
    );
    assert_eq!(error["code"], "invalid_marks");
    assert_eq!(error["details"]["invalidFields"], json!([1, 2]));

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "students.submit",
        json!({ "name": "Carol", "marks": ["-1"] }),
    );
    assert_eq!(error["details"]["invalidFields"], json!([0, 1, 2]));

    let error = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "students.submit",
        json!({ "name": "Carol", "marks": ["1", "2", "3", "4"] }),
    );
    assert_eq!(error["code"], "bad_params");

    let error = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "students.submit",
        json!({ "name": "Carol", "marks": "70,80,90" }),
    );
    assert_eq!(error["code"], "bad_params");

    let listed = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({}));
    assert_eq!(listed["students"], json!([]));

    // Nothing from the rejected submissions reached the store.
    let conn = rusqlite::Connection::open(workspace.path().join("gradebook.sqlite3"))
        .expect("open store");
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM kv_store WHERE key = 'students'",
            [],
            |r| r.get(0),
        )
        .ok();
    assert!(stored.is_none());
}

#[test]
fn submit_without_subjects_is_refused() {
    let workspace = tempfile::tempdir().expect("temp workspace");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_with_subjects(&mut stdin, &mut reader, workspace.path(), &[]);

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "students.submit",
        json!({ "name": "Dan", "marks": [] }),
    );
    assert_eq!(error["code"], "no_subjects");
}
