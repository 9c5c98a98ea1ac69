use crate::gradebook::Gradebook;
use crate::ipc::error::{gradebook_err, ok};
use crate::ipc::helpers::{required_index, required_str, session};
use crate::ipc::types::{AppState, Request};
use crate::report;
use serde_json::json;

/// Subject responses always carry fresh headers so the table can be rebuilt,
/// whether or not the request changed anything.
fn subjects_result(gradebook: &Gradebook, applied: bool) -> serde_json::Value {
    let names = gradebook.subjects().names();
    json!({
        "applied": applied,
        "subjects": names,
        "headers": report::column_headers(names)
    })
}

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, subjects_result(gradebook, false))
}

fn handle_subjects_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match gradebook.add_subject(conn) {
        Ok(added) => {
            let mut result = subjects_result(gradebook, added.is_some());
            result["name"] = json!(added);
            ok(&req.id, result)
        }
        Err(e) => gradebook_err(&req.id, &e),
    }
}

fn handle_subjects_rename(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "index") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (conn, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match gradebook.rename_subject(conn, index, name) {
        Ok(applied) => ok(&req.id, subjects_result(gradebook, applied)),
        Err(e) => gradebook_err(&req.id, &e),
    }
}

fn handle_subjects_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "index") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (conn, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match gradebook.remove_subject(conn, index) {
        Ok(removed) => {
            let mut result = subjects_result(gradebook, true);
            result["removed"] = json!(removed);
            ok(&req.id, result)
        }
        Err(e) => gradebook_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.add" => Some(handle_subjects_add(state, req)),
        "subjects.rename" => Some(handle_subjects_rename(state, req)),
        "subjects.remove" => Some(handle_subjects_remove(state, req)),
        _ => None,
    }
}
