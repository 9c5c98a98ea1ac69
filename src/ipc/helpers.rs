use rusqlite::Connection;

use super::error::err;
use super::types::{AppState, Request};
use crate::gradebook::Gradebook;

/// Splits the state into the open store and the gradebook it mirrors.
pub fn session<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<(&'a Connection, &'a mut Gradebook), serde_json::Value> {
    let AppState { db, gradebook, .. } = state;
    let Some(conn) = db.as_ref() else {
        return Err(err(&req.id, "no_workspace", "select a workspace first", None));
    };
    Ok((conn, gradebook))
}

pub fn required_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn required_index(req: &Request, key: &str) -> Result<usize, serde_json::Value> {
    let Some(v) = req.params.get(key) else {
        return Err(err(&req.id, "bad_params", format!("missing {}", key), None));
    };
    v.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a non-negative integer", key),
                Some(serde_json::json!({ "key": key, "value": v })),
            )
        })
}
