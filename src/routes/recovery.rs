use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::dto::interview_dto::RecoveryChoiceRequest;
use crate::error::Result;
use crate::AppState;

/// The offer is returned at most once per process; later calls get `null`.
#[axum::debug_handler]
pub async fn get_recovery_offer(State(state): State<AppState>) -> Result<Response> {
    let offer = state.interview.recovery_offer().await?;
    Ok(Json(json!({ "offer": offer })).into_response())
}

#[axum::debug_handler]
pub async fn choose_recovery(
    State(state): State<AppState>,
    Json(payload): Json<RecoveryChoiceRequest>,
) -> Result<Response> {
    let view = state.interview.choose_recovery(payload.choice).await?;
    Ok(Json(view).into_response())
}
