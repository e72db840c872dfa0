use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::question::Difficulty;
use crate::models::session::SessionStatus;
use crate::services::session_service::{SessionContext, TimerDirective};

/// What the candidate is shown when an interrupted interview is found.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoveryOffer {
    pub candidate_id: Option<Uuid>,
    pub candidate_name: Option<String>,
    pub questions_completed: usize,
    pub total_questions: usize,
    pub current_question: usize,
    pub current_difficulty: Option<Difficulty>,
    pub current_time_limit: Option<u32>,
    pub time_remaining: u32,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryChoice {
    Continue,
    StartOver,
    Cancel,
}

pub struct RecoveryController;

impl RecoveryController {
    fn is_recoverable(ctx: &SessionContext) -> bool {
        let session = &ctx.session;
        ctx.restored
            && matches!(
                session.status,
                SessionStatus::InProgress | SessionStatus::Paused
            )
            && !session.questions.is_empty()
            && session.current_question_index < session.questions.len()
    }

    /// Offers continuation of an interrupted interview, at most once per process.
    pub fn offer(ctx: &mut SessionContext) -> Option<RecoveryOffer> {
        if ctx.recovery_prompt_shown || !Self::is_recoverable(ctx) {
            return None;
        }
        ctx.recovery_prompt_shown = true;

        let session = &ctx.session;
        let current = session.current_question();
        let offer = RecoveryOffer {
            candidate_id: session.candidate_id,
            candidate_name: ctx.candidate.as_ref().map(|c| c.name.clone()),
            questions_completed: session.current_question_index,
            total_questions: session.questions.len(),
            current_question: session.current_question_index + 1,
            current_difficulty: current.map(|q| q.difficulty),
            current_time_limit: current.map(|q| q.time_limit),
            time_remaining: session.time_remaining,
            status: session.status,
        };
        tracing::info!(
            question = offer.current_question,
            time_remaining = offer.time_remaining,
            "Offering to resume interrupted interview"
        );
        Some(offer)
    }

    /// Applies the candidate's choice. Only `Continue` touches the session.
    pub fn choose(
        ctx: &mut SessionContext,
        choice: RecoveryChoice,
    ) -> Result<Option<TimerDirective>> {
        match choice {
            RecoveryChoice::StartOver | RecoveryChoice::Cancel => {
                tracing::info!(?choice, "Recovery prompt dismissed");
                Ok(None)
            }
            RecoveryChoice::Continue => {
                if !Self::is_recoverable(ctx) {
                    return Err(Error::invalid_state(
                        "there is no interrupted interview to continue",
                    ));
                }
                ctx.restored = false;
                if ctx.session.status == SessionStatus::Paused {
                    ctx.resume()
                } else {
                    Ok(ctx.rearm_if_unsealed())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::Candidate;
    use crate::services::ai_contract::fallback_questions;

    fn interrupted(paused: bool) -> SessionContext {
        let mut live = SessionContext::new();
        live.start(Candidate::new("A".into(), None, None), fallback_questions())
            .unwrap();
        for _ in 0..3 {
            live.session
                .current_question_mut()
                .unwrap()
                .finalize("answer".into(), 5, 6)
                .unwrap();
            live.advance().unwrap();
        }
        live.session.time_remaining = 40;
        if paused {
            live.pause(None).unwrap();
        }
        SessionContext::restore(live.session.clone(), live.candidate.clone())
    }

    #[test]
    fn offer_is_shown_once() {
        let mut ctx = interrupted(true);
        let offer = RecoveryController::offer(&mut ctx).unwrap();
        assert_eq!(offer.questions_completed, 3);
        assert_eq!(offer.current_question, 4);
        assert_eq!(offer.current_time_limit, Some(60));
        assert_eq!(offer.time_remaining, 40);
        assert_eq!(offer.candidate_name.as_deref(), Some("A"));

        assert!(RecoveryController::offer(&mut ctx).is_none());
    }

    #[test]
    fn live_session_is_not_offered() {
        let mut ctx = SessionContext::new();
        ctx.start(Candidate::new("A".into(), None, None), fallback_questions())
            .unwrap();
        assert!(RecoveryController::offer(&mut ctx).is_none());
        assert!(!ctx.recovery_prompt_shown());
    }

    #[test]
    fn completed_session_is_not_offered() {
        let mut ctx = interrupted(false);
        ctx.session.status = SessionStatus::Completed;
        assert!(RecoveryController::offer(&mut ctx).is_none());
    }

    #[test]
    fn continue_from_pause_rearms_frozen_time() {
        let mut ctx = interrupted(true);
        RecoveryController::offer(&mut ctx).unwrap();
        let directive = RecoveryController::choose(&mut ctx, RecoveryChoice::Continue).unwrap();

        assert_eq!(
            directive,
            Some(TimerDirective::Arm {
                question_index: 3,
                time_limit: 60,
                remaining: 40
            })
        );
        assert_eq!(ctx.session.status, SessionStatus::InProgress);
        assert_eq!(ctx.session.current_question_index, 3);
    }

    #[test]
    fn continue_from_in_progress_rearms_frozen_time() {
        let mut ctx = interrupted(false);
        let directive = RecoveryController::choose(&mut ctx, RecoveryChoice::Continue).unwrap();
        assert!(matches!(directive, Some(TimerDirective::Arm { remaining: 40, .. })));
    }

    #[test]
    fn start_over_and_cancel_leave_session_untouched() {
        let mut ctx = interrupted(true);
        let before = ctx.session.clone();
        RecoveryController::offer(&mut ctx).unwrap();

        assert_eq!(RecoveryController::choose(&mut ctx, RecoveryChoice::StartOver).unwrap(), None);
        assert_eq!(RecoveryController::choose(&mut ctx, RecoveryChoice::Cancel).unwrap(), None);
        assert_eq!(ctx.session, before);
    }
}
