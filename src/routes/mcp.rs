use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::mcp::protocol::{error_codes, JsonRpcResponse};
use crate::AppState;

/// One JSON-RPC message per request. Notifications are acknowledged with
/// 202 and an empty body.
pub async fn handle_mcp(State(state): State<AppState>, body: Bytes) -> Response {
    let raw = match std::str::from_utf8(&body) {
        Ok(raw) => raw,
        Err(e) => {
            return Json(JsonRpcResponse::error(
                None,
                error_codes::PARSE_ERROR,
                format!("request body is not UTF-8: {e}"),
            ))
            .into_response();
        }
    };

    match state.mcp.handle_message(raw).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
