use serde_json::json;

use crate::gradebook::GradebookError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn gradebook_err(id: &str, e: &GradebookError) -> serde_json::Value {
    let details = match e {
        GradebookError::InvalidMarks { fields } => Some(json!({ "invalidFields": fields })),
        GradebookError::TooManyMarks { given, subjects } => {
            Some(json!({ "given": given, "subjects": subjects }))
        }
        GradebookError::IndexOutOfRange { kind, index, len } => {
            Some(json!({ "kind": kind, "index": index, "len": len }))
        }
        _ => None,
    };
    err(id, e.code(), format!("{e:#}"), details)
}
