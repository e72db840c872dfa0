use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStatus};
use crate::models::session::InterviewSession;
use crate::services::recovery_service::RecoveryChoice;
use crate::services::store_service::{CandidateFilter, CandidateSort, SortOrder};

/// Intake form. Fields come from the resume extractor or the candidate and any
/// of them may be missing; only the name is required to begin.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidateIntake {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email address is not valid"))]
    pub email: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
}

impl CandidateIntake {
    pub fn into_candidate(self) -> Result<Candidate> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("Name is required".to_string()));
        }
        let trim = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Ok(Candidate::new(name, trim(self.email), trim(self.phone)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_index: usize,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryChoiceRequest {
    pub choice: RecoveryChoice,
}

/// `GET /api/candidates` query string. Everything is optional; the default
/// lists every candidate, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CandidateListQuery {
    #[validate(length(max = 200, message = "Search text is too long"))]
    pub search: Option<String>,
    pub status: Option<CandidateStatus>,
    pub sort_by: Option<CandidateSort>,
    pub order: Option<SortOrder>,
}

impl From<CandidateListQuery> for CandidateFilter {
    fn from(query: CandidateListQuery) -> Self {
        Self {
            search: query.search,
            status: query.status,
            sort_by: query.sort_by.unwrap_or_default(),
            order: query.order.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateListItem {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub status: String,
    pub final_score: Option<u8>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Candidate> for CandidateListItem {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            email: candidate.email,
            status: candidate.status.as_str().to_string(),
            final_score: candidate.final_score,
            created_at: candidate.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateDetailResponse {
    pub candidate: Candidate,
    pub session: Option<InterviewSession>,
}
