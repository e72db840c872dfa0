use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;
use crate::models::message::Transcript;
use crate::models::question::Question;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "not_started",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(SessionStatus::NotStarted),
            "in_progress" => Ok(SessionStatus::InProgress),
            "paused" => Ok(SessionStatus::Paused),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(Error::Internal(format!("Unknown session status '{}'", other))),
        }
    }
}

/// State of the single active interview. Only the session state machine and the
/// submission arbitrator mutate it; everything else reads through the accessors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewSession {
    pub(crate) candidate_id: Option<Uuid>,
    pub(crate) questions: Vec<Question>,
    pub(crate) current_question_index: usize,
    pub(crate) status: SessionStatus,
    pub(crate) time_remaining: u32,
    pub(crate) timer_active: bool,
    pub(crate) transcript: Transcript,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Default for InterviewSession {
    fn default() -> Self {
        Self {
            candidate_id: None,
            questions: Vec::new(),
            current_question_index: 0,
            status: SessionStatus::NotStarted,
            time_remaining: 0,
            timer_active: false,
            transcript: Transcript::new(),
            updated_at: Utc::now(),
        }
    }
}

impl InterviewSession {
    pub fn candidate_id(&self) -> Option<Uuid> {
        self.candidate_id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn timer_active(&self) -> bool {
        self.timer_active
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_sealed()).count()
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question_index + 1 >= self.questions.len()
    }

    pub(crate) fn current_question_mut(&mut self) -> Option<&mut Question> {
        self.questions.get_mut(self.current_question_index)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
