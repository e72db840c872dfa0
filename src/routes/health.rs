use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.interview.view();
    let body = json!({
        "status": "ok",
        "interview": view.status.as_str(),
    });
    (StatusCode::OK, Json(body))
}
