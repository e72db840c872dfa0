//! Contracts for the AI text-generation collaborators and the local fallbacks
//! that keep an interview moving when they are unavailable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, InterviewSummary, Recommendation};
use crate::models::question::{validate_batch, Difficulty, Question, MAX_SCORE};

pub const FALLBACK_FEEDBACK: &str =
    "Answer evaluated. Consider providing more detailed explanations.";

/// Result of an AI call: the service's own answer, or a locally computed
/// substitute together with the reason the service was bypassed.
#[derive(Debug, Clone, PartialEq)]
pub enum AiOutcome<T> {
    Nominal(T),
    Fallback { value: T, reason: String },
}

impl<T> AiOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            AiOutcome::Nominal(value) | AiOutcome::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            AiOutcome::Nominal(value) | AiOutcome::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AiOutcome::Fallback { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationRequest {
    pub question: String,
    pub answer: String,
    pub time_used: u32,
    pub time_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evaluation {
    pub score: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryRequest {
    pub candidate: Candidate,
    pub questions: Vec<Question>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_questions(&self, role: &str) -> Result<Vec<Question>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<InterviewSummary>;
}

async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::ExternalService(format!(
            "no response within {}s",
            timeout.as_secs()
        ))),
    }
}

pub async fn generate_with_fallback(
    generator: &dyn QuestionGenerator,
    role: &str,
    timeout: Duration,
) -> AiOutcome<Vec<Question>> {
    let result = bounded(timeout, generator.generate_questions(role))
        .await
        .and_then(validate_batch);
    match result {
        Ok(questions) => AiOutcome::Nominal(questions),
        Err(e) => {
            tracing::warn!(error = %e, "Question generation degraded, using built-in set");
            AiOutcome::Fallback {
                value: fallback_questions(),
                reason: e.to_string(),
            }
        }
    }
}

pub async fn evaluate_with_fallback(
    evaluator: &dyn AnswerEvaluator,
    request: &EvaluationRequest,
    timeout: Duration,
) -> AiOutcome<Evaluation> {
    match bounded(timeout, evaluator.evaluate(request)).await {
        Ok(mut evaluation) => {
            evaluation.score = evaluation.score.min(MAX_SCORE);
            AiOutcome::Nominal(evaluation)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Answer evaluation degraded, using heuristic score");
            AiOutcome::Fallback {
                value: heuristic_evaluation(&request.answer, request.time_used, request.time_limit),
                reason: e.to_string(),
            }
        }
    }
}

pub async fn summarize_with_fallback(
    generator: &dyn SummaryGenerator,
    request: &SummaryRequest,
    timeout: Duration,
) -> AiOutcome<InterviewSummary> {
    match bounded(timeout, generator.summarize(request)).await {
        Ok(mut summary) => {
            summary.overall_score = summary.overall_score.min(MAX_SCORE);
            AiOutcome::Nominal(summary)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Summary generation degraded, using local average");
            AiOutcome::Fallback {
                value: fallback_summary(&request.questions),
                reason: e.to_string(),
            }
        }
    }
}

pub fn fallback_questions() -> Vec<Question> {
    [
        (
            Difficulty::Easy,
            "What is the difference between let, const, and var in JavaScript?",
        ),
        (
            Difficulty::Easy,
            "Explain what React hooks are and name three commonly used hooks.",
        ),
        (
            Difficulty::Medium,
            "How would you implement authentication in a React application?",
        ),
        (
            Difficulty::Medium,
            "Explain the concept of middleware in Express.js and provide an example.",
        ),
        (
            Difficulty::Hard,
            "Design a scalable architecture for a real-time chat application using React and \
             Node.js.",
        ),
        (
            Difficulty::Hard,
            "How would you optimize the performance of a React application that handles large \
             datasets?",
        ),
    ]
    .into_iter()
    .enumerate()
    .map(|(idx, (difficulty, text))| Question::new(idx as i32 + 1, difficulty, text))
    .collect()
}

/// Word-count score in 1..=10, docked 20% when more than 80% of the time was used.
pub fn heuristic_evaluation(answer: &str, time_used: u32, time_limit: u32) -> Evaluation {
    let words = answer.split_whitespace().count() as f64;
    let mut score = (words / 10.0).clamp(1.0, MAX_SCORE as f64);
    if time_limit > 0 && time_used as f64 / time_limit as f64 > 0.8 {
        score *= 0.8;
    }
    Evaluation {
        score: score.round() as u8,
        feedback: FALLBACK_FEEDBACK.to_string(),
    }
}

pub fn recommendation_for(average: f64) -> Recommendation {
    if average >= 7.0 {
        Recommendation::Hire
    } else if average >= 5.0 {
        Recommendation::Consider
    } else {
        Recommendation::Reject
    }
}

pub fn fallback_summary(questions: &[Question]) -> InterviewSummary {
    let total: u32 = questions.iter().map(|q| q.score().unwrap_or(0) as u32).sum();
    let average = if questions.is_empty() {
        0.0
    } else {
        total as f64 / questions.len() as f64
    };
    InterviewSummary {
        overall_score: average.round() as u8,
        summary: format!(
            "Candidate completed the interview with an average score of {:.1}/10.",
            average
        ),
        strengths: vec![
            "Completed all questions".to_string(),
            "Showed technical knowledge".to_string(),
        ],
        improvements: vec![
            "Could provide more detailed answers".to_string(),
            "Time management".to_string(),
        ],
        recommendation: recommendation_for(average),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> Duration {
        Duration::from_secs(5)
    }

    #[test]
    fn fallback_set_has_fixed_shape() {
        let questions = validate_batch(fallback_questions()).unwrap();
        assert_eq!(questions.len(), 6);
        assert_eq!(questions[0].time_limit, 20);
        assert_eq!(questions[5].difficulty, Difficulty::Hard);
    }

    #[test]
    fn heuristic_scores_by_length_and_time() {
        assert_eq!(heuristic_evaluation("short", 5, 20).score, 1);
        let forty_words = vec!["word"; 40].join(" ");
        assert_eq!(heuristic_evaluation(&forty_words, 10, 60).score, 4);
        // 4 * 0.8 = 3.2
        assert_eq!(heuristic_evaluation(&forty_words, 55, 60).score, 3);
        let essay = vec!["word"; 500].join(" ");
        assert_eq!(heuristic_evaluation(&essay, 0, 120).score, 10);
    }

    #[test]
    fn recommendation_thresholds() {
        assert_eq!(recommendation_for(7.0), Recommendation::Hire);
        assert_eq!(recommendation_for(6.99), Recommendation::Consider);
        assert_eq!(recommendation_for(5.0), Recommendation::Consider);
        assert_eq!(recommendation_for(4.99), Recommendation::Reject);
    }

    #[tokio::test]
    async fn generator_failure_falls_back_to_builtin_set() {
        let mut generator = MockQuestionGenerator::new();
        generator
            .expect_generate_questions()
            .returning(|_| Err(Error::ExternalService("quota exceeded".into())));

        let outcome = generate_with_fallback(&generator, "Backend", timeout()).await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.into_value(), fallback_questions());
    }

    #[tokio::test]
    async fn malformed_batch_falls_back_to_builtin_set() {
        let mut generator = MockQuestionGenerator::new();
        generator
            .expect_generate_questions()
            .returning(|_| Ok(vec![Question::new(1, Difficulty::Hard, "only one")]));

        let outcome = generate_with_fallback(&generator, "Backend", timeout()).await;
        assert!(outcome.is_fallback());
    }

    #[tokio::test]
    async fn evaluator_score_is_clamped() {
        let mut evaluator = MockAnswerEvaluator::new();
        evaluator.expect_evaluate().returning(|_| {
            Ok(Evaluation {
                score: 42,
                feedback: "great".into(),
            })
        });
        let request = EvaluationRequest {
            question: "q".into(),
            answer: "a".into(),
            time_used: 3,
            time_limit: 20,
        };

        let outcome = evaluate_with_fallback(&evaluator, &request, timeout()).await;
        assert_eq!(
            outcome,
            AiOutcome::Nominal(Evaluation {
                score: 10,
                feedback: "great".into()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_evaluator_is_treated_as_failure() {
        struct Stalled;

        #[async_trait]
        impl AnswerEvaluator for Stalled {
            async fn evaluate(&self, _request: &EvaluationRequest) -> Result<Evaluation> {
                std::future::pending().await
            }
        }

        let request = EvaluationRequest {
            question: "q".into(),
            answer: "one two three".into(),
            time_used: 3,
            time_limit: 20,
        };
        let outcome = evaluate_with_fallback(&Stalled, &request, timeout()).await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.value().feedback, FALLBACK_FEEDBACK);
    }
}
