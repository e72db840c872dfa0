use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::models::message::Author;
use crate::models::session::SessionStatus;
use crate::services::ai_contract::{AiOutcome, Evaluation, EvaluationRequest};
use crate::services::session_service::{SessionContext, TimerDirective};
use crate::services::timer_service::Countdown;

pub const EXPIRED_ANSWER: &str = "No answer provided (time expired)";
pub const EXPIRED_NOTICE: &str = "Time's up! Moving to the next question.";

/// A manual answer whose evaluation is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub token: u64,
    pub question_index: usize,
    pub answer: String,
    pub time_used: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManualDecision {
    /// The answer was accepted; the evaluator must be called with `request`.
    Dispatch {
        token: u64,
        request: EvaluationRequest,
    },
    /// The question was already finalized or an answer for it is being evaluated.
    Ignored,
}

/// A question that has just been sealed.
#[derive(Debug, Clone, PartialEq)]
pub struct Finalized {
    pub question_index: usize,
    pub answer: String,
    pub time_used: u32,
    pub score: u8,
    pub feedback: Option<String>,
    pub degraded: bool,
}

/// Decides which of the competing submissions for a question gets to finalize it.
///
/// A question is sealed by the first finalize; manual answers and expiry that
/// arrive afterwards are no-ops, and evaluator results whose token no longer
/// matches the pending submission are dropped.
#[derive(Debug, Default)]
pub struct Arbitrator {
    pending: Option<PendingSubmission>,
    next_token: u64,
}

impl Arbitrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops any in-flight submission, e.g. when the session is discarded.
    pub fn clear(&mut self) -> Option<PendingSubmission> {
        self.pending.take()
    }

    pub fn submit_manual(
        &mut self,
        ctx: &mut SessionContext,
        countdown: &mut Countdown,
        question_index: usize,
        text: &str,
        now: Instant,
    ) -> Result<ManualDecision> {
        let answer = text.trim();
        if answer.is_empty() {
            return Err(Error::Validation(
                "Please provide an answer before submitting.".to_string(),
            ));
        }

        match ctx.session.status {
            SessionStatus::InProgress => {}
            SessionStatus::Completed => return Ok(ManualDecision::Ignored),
            other => {
                return Err(Error::invalid_state(format!(
                    "cannot submit an answer while interview is {}",
                    other.as_str()
                )))
            }
        }

        let current = ctx.session.current_question_index;
        let question = match ctx.session.current_question() {
            Some(q) if q.is_sealed() => return Ok(ManualDecision::Ignored),
            Some(q) => q,
            None => return Err(Error::invalid_state("no question is active")),
        };
        if question_index != current || self.pending.is_some() {
            tracing::debug!(question_index, current, "Manual submission superseded");
            return Ok(ManualDecision::Ignored);
        }

        let time_limit = question.time_limit;
        let prompt = question.question.clone();
        let time_used = countdown
            .time_used(now)
            .unwrap_or(time_limit - ctx.session.time_remaining.min(time_limit));
        if let Some(remaining) = countdown.disarm(now) {
            ctx.session.time_remaining = remaining;
        }
        ctx.session.timer_active = false;
        ctx.push_message(Author::User, answer);

        self.next_token += 1;
        let token = self.next_token;
        self.pending = Some(PendingSubmission {
            token,
            question_index: current,
            answer: answer.to_string(),
            time_used,
        });

        tracing::info!(question_index = current, time_used, "Answer submitted for evaluation");
        Ok(ManualDecision::Dispatch {
            token,
            request: EvaluationRequest {
                question: prompt,
                answer: answer.to_string(),
                time_used,
                time_limit,
            },
        })
    }

    /// Applies an evaluator result. Returns `None` when the result is stale.
    pub fn complete_manual(
        &mut self,
        ctx: &mut SessionContext,
        token: u64,
        outcome: AiOutcome<Evaluation>,
    ) -> Result<Option<Finalized>> {
        let pending = match &self.pending {
            Some(p) if p.token == token => p.clone(),
            _ => {
                tracing::warn!(token, "Discarding evaluation for a superseded submission");
                return Ok(None);
            }
        };

        let sealed = ctx
            .session
            .questions
            .get(pending.question_index)
            .map(|q| q.is_sealed())
            .unwrap_or(true);
        if sealed || ctx.session.current_question_index != pending.question_index {
            self.pending = None;
            tracing::warn!(
                question_index = pending.question_index,
                "Discarding evaluation for an already finalized question"
            );
            return Ok(None);
        }

        let degraded = outcome.is_fallback();
        let evaluation = outcome.into_value();
        self.pending = None;

        let question = ctx
            .session
            .questions
            .get_mut(pending.question_index)
            .ok_or_else(|| Error::invalid_state("pending question disappeared"))?;
        let record = question
            .finalize(pending.answer.clone(), pending.time_used, evaluation.score)?
            .clone();

        ctx.push_message(
            Author::Ai,
            format!("Score: {}/10. {}", record.score, evaluation.feedback),
        );

        tracing::info!(
            question_index = pending.question_index,
            score = record.score,
            degraded,
            "Answer finalized"
        );
        Ok(Some(Finalized {
            question_index: pending.question_index,
            answer: record.answer,
            time_used: record.time_used,
            score: record.score,
            feedback: Some(evaluation.feedback),
            degraded,
        }))
    }

    /// The evaluation could not be completed at all. The question stays open and
    /// the countdown resumes from where the submission froze it.
    pub fn abort_manual(&mut self, ctx: &mut SessionContext, token: u64) -> Option<TimerDirective> {
        match &self.pending {
            Some(p) if p.token == token => {}
            _ => return None,
        }
        self.pending = None;
        ctx.push_message(
            Author::System,
            "Your answer could not be evaluated. Please submit it again.",
        );
        ctx.rearm_if_unsealed()
    }

    /// Forced submission on timer expiry. Cannot fail; a no-op if the question is
    /// already sealed.
    pub fn submit_on_expiry(&mut self, ctx: &mut SessionContext) -> Result<Option<Finalized>> {
        if ctx.session.status != SessionStatus::InProgress {
            return Ok(None);
        }
        let index = ctx.session.current_question_index;
        let time_limit = match ctx.session.current_question() {
            Some(q) if !q.is_sealed() => q.time_limit,
            _ => return Ok(None),
        };

        if let Some(pending) = self.pending.take() {
            tracing::warn!(
                question_index = pending.question_index,
                "Expiry won over an in-flight evaluation"
            );
        }

        ctx.session.time_remaining = 0;
        ctx.session.timer_active = false;
        ctx.push_message(Author::System, EXPIRED_NOTICE);
        ctx.push_message(Author::User, EXPIRED_ANSWER);

        let question = ctx
            .session
            .current_question_mut()
            .ok_or_else(|| Error::invalid_state("no question is active"))?;
        let record = question
            .finalize(EXPIRED_ANSWER.to_string(), time_limit, 0)?
            .clone();

        tracing::info!(question_index = index, "Question expired without an answer");
        Ok(Some(Finalized {
            question_index: index,
            answer: record.answer,
            time_used: record.time_used,
            score: 0,
            feedback: None,
            degraded: false,
        }))
    }
}
