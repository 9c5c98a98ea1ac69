use crate::db;
use crate::gradebook::Gradebook;
use crate::ipc::error::{err, gradebook_err, ok};
use crate::ipc::helpers::session;
use crate::ipc::types::{AppState, Request};
use crate::report;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

/// Opens (or creates) the workspace store and hydrates the gradebook from it.
/// The previous workspace, if any, is only replaced once the new one opened.
pub fn select_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let conn = db::open_db(path)?;
    let gradebook = Gradebook::load(&conn);
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.gradebook = gradebook;
    info!(workspace = %path.to_string_lossy(), "workspace selected");
    Ok(())
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match select_workspace(state, &path) {
        Ok(()) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "subjectCount": state.gradebook.subjects().len(),
                "studentCount": state.gradebook.students().len()
            }),
        ),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:#}"), None),
    }
}

/// Everything the page needs for its first render.
fn handle_gradebook_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subjects = gradebook.subjects().names();
    let students = gradebook.students().records();
    ok(
        &req.id,
        json!({
            "subjects": subjects,
            "students": students,
            "headers": report::column_headers(subjects),
            "rows": report::table_rows(students)
        }),
    )
}

fn handle_gradebook_clear_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (conn, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let confirmed = req
        .params
        .get("confirm")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if let Err(e) = gradebook.clear_all(conn, confirmed) {
        return gradebook_err(&req.id, &e);
    }
    ok(
        &req.id,
        json!({
            "subjects": [],
            "students": [],
            "headers": report::column_headers(&[]),
            "rows": []
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "gradebook.load" => Some(handle_gradebook_load(state, req)),
        "gradebook.clearAll" => Some(handle_gradebook_clear_all(state, req)),
        _ => None,
    }
}
