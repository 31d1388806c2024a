use axum::Json;
use serde_json::{Value as JsonValue, json};

use crate::http::types::ApiResponse;

pub async fn healthcheck_handler() -> Json<ApiResponse<JsonValue>> {
    Json(ApiResponse::ok(json!({ "status": "ok" })))
}
