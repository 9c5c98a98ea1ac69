use crate::ipc::error::ok;
use crate::ipc::helpers::session;
use crate::ipc::types::{AppState, Request};
use crate::report;
use serde_json::json;

fn handle_table_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "headers": report::column_headers(gradebook.subjects().names()),
            "rows": report::table_rows(gradebook.students().records())
        }),
    )
}

fn handle_export_results_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (_, gradebook) = match session(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let model = report::export_model(
        gradebook.subjects().names(),
        gradebook.students().records(),
    );
    ok(&req.id, json!(model))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "table.model" => Some(handle_table_model(state, req)),
        "export.resultsModel" => Some(handle_export_results_model(state, req)),
        _ => None,
    }
}
