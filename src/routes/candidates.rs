use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::interview_dto::{CandidateDetailResponse, CandidateListItem, CandidateListQuery};
use crate::error::{Error, Result};
use crate::services::store_service::CandidateFilter;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_candidates(
    State(state): State<AppState>,
    Query(query): Query<CandidateListQuery>,
) -> Result<Response> {
    query.validate()?;
    let items: Vec<CandidateListItem> = state
        .store
        .list_candidates(&CandidateFilter::from(query))
        .await?
        .into_iter()
        .map(CandidateListItem::from)
        .collect();
    Ok(Json(items).into_response())
}

#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let candidate = state
        .store
        .get_candidate(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", id)))?;
    let session = state.store.get_session(id).await?;
    Ok(Json(CandidateDetailResponse { candidate, session }).into_response())
}
