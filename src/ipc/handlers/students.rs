use crate::gradebook::Gradebook;
use crate::ipc::error::{err, gradebook_err, ok};
use crate::ipc::helpers::{required_index, session};
use crate::ipc::types::{AppState, Request};
use crate::report;
use serde_json::json;

/// Form fields arrive as text, but numbers are accepted and read the same way.
/// Anything else is an unreadable field.
fn raw_mark_field(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_raw_marks(req: &Request) -> Result<Vec<String>, serde_json::Value> {
    match req.params.get("marks") {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(serde_json::Value::Array(items)) => Ok(items.iter().map(raw_mark_field).collect()),
        Some(other) => Err(err(
            &req.id,
            "bad_params",
            "marks must be an array with one entry per subject",
            Some(json!({ "marks": other })),
        )),
    }
}

fn rows(gradebook: &Gradebook) -> serde_json::Value {
    json!(report::table_rows(gradebook.students().records()))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "students": gradebook.students().records(),
            "rows": rows(gradebook)
        }),
    )
}

fn handle_students_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = req
        .params
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let raw_marks = match parse_raw_marks(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (conn, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student = match gradebook.submit_student(conn, name, &raw_marks) {
        Ok(record) => record.clone(),
        Err(e) => return gradebook_err(&req.id, &e),
    };
    ok(
        &req.id,
        json!({
            "student": student,
            "index": gradebook.students().len() - 1,
            "clearForm": true,
            "rows": rows(gradebook)
        }),
    )
}

fn handle_students_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "index") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (conn, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match gradebook.edit_student(conn, index) {
        Ok(draft) => ok(
            &req.id,
            json!({
                "draft": draft,
                "rows": rows(gradebook)
            }),
        ),
        Err(e) => gradebook_err(&req.id, &e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "index") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (conn, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match gradebook.delete_student(conn, index) {
        Ok(removed) => ok(
            &req.id,
            json!({
                "removed": removed,
                "rows": rows(gradebook)
            }),
        ),
        Err(e) => gradebook_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.submit" => Some(handle_students_submit(state, req)),
        "students.edit" => Some(handle_students_edit(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
