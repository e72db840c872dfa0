use serde::Serialize;

use crate::models::candidate::{Candidate, CandidateStatus, InterviewSummary};
use crate::models::question::Question;

/// Running totals over the finalized questions of a session.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct ScoreBoard {
    pub total: u32,
    pub finalized: usize,
    pub average: f64,
}

pub struct ScoreAggregator;

impl ScoreAggregator {
    pub fn tally(questions: &[Question]) -> ScoreBoard {
        let (total, finalized) = questions
            .iter()
            .filter_map(|q| q.score())
            .fold((0u32, 0usize), |(sum, n), s| (sum + s as u32, n + 1));
        let average = if finalized == 0 {
            0.0
        } else {
            total as f64 / finalized as f64
        };
        ScoreBoard {
            total,
            finalized,
            average,
        }
    }

    /// Writes the verdict onto the candidate and marks them completed.
    pub fn apply_summary(candidate: &mut Candidate, summary: InterviewSummary) {
        candidate.final_score = Some(summary.overall_score);
        candidate.summary = Some(summary);
        candidate.set_status(CandidateStatus::Completed);
    }

    pub fn completion_message(summary: &InterviewSummary) -> String {
        format!(
            "Interview completed! Your final score is {}/10. {}",
            summary.overall_score, summary.summary
        )
    }
}
