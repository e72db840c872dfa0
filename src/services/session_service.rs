use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStatus};
use crate::models::message::Author;
use crate::models::question::{Question, QUESTION_COUNT};
use crate::models::session::{InterviewSession, SessionStatus};

/// Instruction for the countdown produced by a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDirective {
    Arm {
        question_index: usize,
        time_limit: u32,
        remaining: u32,
    },
    Disarm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progression {
    Next(TimerDirective),
    Completed,
}

/// Everything one interview needs, owned by whoever drives it.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub(crate) session: InterviewSession,
    pub(crate) candidate: Option<Candidate>,
    pub(crate) recovery_prompt_shown: bool,
    pub(crate) restored: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context rebuilt from persisted state after a restart. No timer survives a
    /// restart, so the timer flag is cleared until the session is continued.
    pub fn restore(mut session: InterviewSession, candidate: Option<Candidate>) -> Self {
        session.timer_active = false;
        Self {
            session,
            candidate,
            recovery_prompt_shown: false,
            restored: true,
        }
    }

    pub fn session(&self) -> &InterviewSession {
        &self.session
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    pub fn recovery_prompt_shown(&self) -> bool {
        self.recovery_prompt_shown
    }

    fn require_status(&self, expected: SessionStatus, operation: &str) -> Result<()> {
        if self.session.status != expected {
            return Err(Error::invalid_state(format!(
                "cannot {} while interview is {}",
                operation,
                self.session.status.as_str()
            )));
        }
        Ok(())
    }

    fn set_candidate_status(&mut self, status: CandidateStatus) {
        if let Some(candidate) = self.candidate.as_mut() {
            candidate.set_status(status);
        }
    }

    fn arm_current(&mut self, remaining: u32) -> TimerDirective {
        let time_limit = self
            .session
            .current_question()
            .map(|q| q.time_limit)
            .unwrap_or_default();
        self.session.time_remaining = remaining.min(time_limit);
        self.session.timer_active = true;
        TimerDirective::Arm {
            question_index: self.session.current_question_index,
            time_limit,
            remaining: self.session.time_remaining,
        }
    }

    pub(crate) fn push_message(&mut self, author: Author, text: impl Into<String>) {
        self.session.transcript.push(author, text);
        self.session.touch();
    }

    /// Announces the current question in the transcript.
    pub(crate) fn ask_current_question(&mut self) {
        let index = self.session.current_question_index;
        let total = self.session.questions.len();
        if let Some(q) = self.session.current_question() {
            let text = format!(
                "Question {}/{} ({}): {}",
                index + 1,
                total,
                q.difficulty.as_str().to_uppercase(),
                q.question
            );
            self.push_message(Author::Ai, text);
        }
    }

    pub fn start(
        &mut self,
        mut candidate: Candidate,
        questions: Vec<Question>,
    ) -> Result<TimerDirective> {
        self.require_status(SessionStatus::NotStarted, "start")?;
        if questions.len() != QUESTION_COUNT {
            return Err(Error::Validation(format!(
                "an interview needs exactly {} questions, got {}",
                QUESTION_COUNT,
                questions.len()
            )));
        }

        candidate.set_status(CandidateStatus::InProgress);
        self.session = InterviewSession {
            candidate_id: Some(candidate.id),
            questions,
            status: SessionStatus::InProgress,
            ..InterviewSession::default()
        };
        self.candidate = Some(candidate);
        self.recovery_prompt_shown = false;
        self.restored = false;

        tracing::info!(candidate_id = ?self.session.candidate_id, "Interview started");
        Ok(self.arm_current(u32::MAX))
    }

    /// Moves past the current, already finalized question.
    pub fn advance(&mut self) -> Result<Progression> {
        self.require_status(SessionStatus::InProgress, "advance")?;
        let sealed = self
            .session
            .current_question()
            .map(|q| q.is_sealed())
            .unwrap_or(false);
        if !sealed {
            return Err(Error::invalid_state(format!(
                "question {} advanced before being finalized",
                self.session.current_question_index + 1
            )));
        }

        self.session.touch();
        if self.session.is_last_question() {
            self.session.status = SessionStatus::Completed;
            self.session.timer_active = false;
            tracing::info!(candidate_id = ?self.session.candidate_id, "Interview completed");
            return Ok(Progression::Completed);
        }

        self.session.current_question_index += 1;
        tracing::info!(
            question_index = self.session.current_question_index,
            "Advanced to next question"
        );
        Ok(Progression::Next(self.arm_current(u32::MAX)))
    }

    /// Pauses the interview. `remaining` is the countdown value at the moment of pausing.
    pub fn pause(&mut self, remaining: Option<u32>) -> Result<TimerDirective> {
        self.require_status(SessionStatus::InProgress, "pause")?;
        if let Some(remaining) = remaining {
            self.session.time_remaining = remaining;
        }
        self.session.status = SessionStatus::Paused;
        self.session.timer_active = false;
        self.session.touch();
        self.set_candidate_status(CandidateStatus::Paused);
        tracing::info!(time_remaining = self.session.time_remaining, "Interview paused");
        Ok(TimerDirective::Disarm)
    }

    /// Resumes with the time frozen at pause, not the full limit.
    pub fn resume(&mut self) -> Result<Option<TimerDirective>> {
        self.require_status(SessionStatus::Paused, "resume")?;
        self.session.status = SessionStatus::InProgress;
        self.session.touch();
        self.set_candidate_status(CandidateStatus::InProgress);
        tracing::info!(time_remaining = self.session.time_remaining, "Interview resumed");
        Ok(self.rearm_if_unsealed())
    }

    /// Re-arms at the frozen remaining time if the current question is still open.
    pub(crate) fn rearm_if_unsealed(&mut self) -> Option<TimerDirective> {
        let open = self
            .session
            .current_question()
            .map(|q| !q.is_sealed())
            .unwrap_or(false);
        if open && self.session.status == SessionStatus::InProgress {
            Some(self.arm_current(self.session.time_remaining))
        } else {
            None
        }
    }

    /// Discards the active session so a new interview can begin and hands back
    /// the candidate it belonged to. The caller disarms the countdown.
    pub fn reset(&mut self) -> Option<Candidate> {
        if matches!(
            self.session.status,
            SessionStatus::InProgress | SessionStatus::Paused
        ) {
            self.set_candidate_status(CandidateStatus::Paused);
        }
        self.session = InterviewSession::default();
        self.restored = false;
        tracing::info!("Interview session reset");
        self.candidate.take()
    }
}
