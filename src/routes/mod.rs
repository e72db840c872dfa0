pub mod candidates;
pub mod health;
pub mod interview;
pub mod recovery;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::cors::interview_cors;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let interview_api = Router::new()
        .route(
            "/api/interview",
            get(interview::get_interview).post(interview::begin_interview),
        )
        .route("/api/interview/answer", post(interview::submit_answer))
        .route("/api/interview/pause", post(interview::pause_interview))
        .route("/api/interview/resume", post(interview::resume_interview))
        .route("/api/interview/abandon", post(interview::abandon_interview))
        .route(
            "/api/recovery",
            get(recovery::get_recovery_offer).post(recovery::choose_recovery),
        );

    let candidate_api = Router::new()
        .route("/api/candidates", get(candidates::list_candidates))
        .route("/api/candidates/:id", get(candidates::get_candidate));

    Router::new()
        .route("/health", get(health::health))
        .merge(interview_api)
        .merge(candidate_api)
        .with_state(state)
        .layer(interview_cors())
        .layer(TraceLayer::new_for_http())
}
