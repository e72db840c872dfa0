use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Ready,
    InProgress,
    Paused,
    Completed,
}

impl CandidateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStatus::Ready => "ready",
            CandidateStatus::InProgress => "in_progress",
            CandidateStatus::Paused => "paused",
            CandidateStatus::Completed => "completed",
        }
    }
}

impl FromStr for CandidateStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(CandidateStatus::Ready),
            "in_progress" => Ok(CandidateStatus::InProgress),
            "paused" => Ok(CandidateStatus::Paused),
            "completed" => Ok(CandidateStatus::Completed),
            other => Err(Error::Internal(format!("Unknown candidate status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Hire,
    Consider,
    Reject,
}

/// Final verdict written onto the candidate when the interview completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewSummary {
    pub overall_score: u8,
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: CandidateStatus,
    pub final_score: Option<u8>,
    pub summary: Option<InterviewSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn new(name: String, email: Option<String>, phone: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            status: CandidateStatus::Ready,
            final_score: None,
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn set_status(&mut self, status: CandidateStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
