use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::dto::interview_dto::{CandidateIntake, SubmitAnswerRequest};
use crate::error::Result;
use crate::AppState;

#[axum::debug_handler]
pub async fn begin_interview(
    State(state): State<AppState>,
    Json(payload): Json<CandidateIntake>,
) -> Result<Response> {
    payload.validate()?;
    let candidate = payload.into_candidate()?;
    tracing::info!(candidate_id = %candidate.id, "Intake accepted");

    let view = state.interview.begin_interview(candidate).await?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

#[axum::debug_handler]
pub async fn get_interview(State(state): State<AppState>) -> Result<Response> {
    Ok(Json(state.interview.view()).into_response())
}

#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Response> {
    let outcome = state
        .interview
        .submit_answer(payload.question_index, payload.answer)
        .await?;
    Ok(Json(outcome).into_response())
}

#[axum::debug_handler]
pub async fn pause_interview(State(state): State<AppState>) -> Result<Response> {
    let view = state.interview.pause().await?;
    Ok(Json(view).into_response())
}

#[axum::debug_handler]
pub async fn resume_interview(State(state): State<AppState>) -> Result<Response> {
    let view = state.interview.resume().await?;
    Ok(Json(view).into_response())
}

#[axum::debug_handler]
pub async fn abandon_interview(State(state): State<AppState>) -> Result<Response> {
    let view = state.interview.abandon().await?;
    Ok(Json(view).into_response())
}
