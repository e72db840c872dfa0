use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of questions in every interview.
pub const QUESTION_COUNT: usize = 6;

/// Fixed generation contract: two easy, two medium, two hard, in that order.
pub const INTERVIEW_SHAPE: [Difficulty; QUESTION_COUNT] = [
    Difficulty::Easy,
    Difficulty::Easy,
    Difficulty::Medium,
    Difficulty::Medium,
    Difficulty::Hard,
    Difficulty::Hard,
];

pub const MAX_SCORE: u8 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Seconds allowed for a question of this difficulty.
    pub fn time_limit(self) -> u32 {
        match self {
            Difficulty::Easy => 20,
            Difficulty::Medium => 60,
            Difficulty::Hard => 120,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// The answer, time used and score of a finalized question. Recorded as one
/// value so a question can never be partially finalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerRecord {
    pub answer: String,
    pub time_used: u32,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: i32,
    pub difficulty: Difficulty,
    pub question: String,
    pub time_limit: u32,
    #[serde(flatten)]
    record: Option<AnswerRecord>,
}

impl Question {
    pub fn new(id: i32, difficulty: Difficulty, question: impl Into<String>) -> Self {
        Self {
            id,
            difficulty,
            question: question.into(),
            time_limit: difficulty.time_limit(),
            record: None,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.record.is_some()
    }

    pub fn answer(&self) -> Option<&str> {
        self.record.as_ref().map(|r| r.answer.as_str())
    }

    pub fn time_used(&self) -> Option<u32> {
        self.record.as_ref().map(|r| r.time_used)
    }

    pub fn score(&self) -> Option<u8> {
        self.record.as_ref().map(|r| r.score)
    }

    /// Seals the question. Time used is clamped to the limit and the score to 0..=10.
    pub(crate) fn finalize(
        &mut self,
        answer: String,
        time_used: u32,
        score: u8,
    ) -> Result<&AnswerRecord> {
        if self.is_sealed() {
            return Err(Error::invalid_state(format!(
                "question {} has already been finalized",
                self.id
            )));
        }
        let record = self.record.insert(AnswerRecord {
            answer,
            time_used: time_used.min(self.time_limit),
            score: score.min(MAX_SCORE),
        });
        Ok(&*record)
    }
}

/// Checks a generated batch against the fixed 2/2/2 shape and renumbers it 1..=6.
pub fn validate_batch(mut questions: Vec<Question>) -> Result<Vec<Question>> {
    if questions.len() != QUESTION_COUNT {
        return Err(Error::ExternalService(format!(
            "expected {} questions, got {}",
            QUESTION_COUNT,
            questions.len()
        )));
    }

    for (idx, (q, expected)) in questions.iter_mut().zip(INTERVIEW_SHAPE).enumerate() {
        if q.difficulty != expected || q.time_limit != expected.time_limit() {
            return Err(Error::ExternalService(format!(
                "question {} is {} / {}s, expected {} / {}s",
                idx + 1,
                q.difficulty.as_str(),
                q.time_limit,
                expected.as_str(),
                expected.time_limit()
            )));
        }
        if q.question.trim().is_empty() {
            return Err(Error::ExternalService(format!("question {} has no text", idx + 1)));
        }
        if q.is_sealed() {
            return Err(Error::ExternalService(format!(
                "question {} arrived already answered",
                idx + 1
            )));
        }
        q.id = idx as i32 + 1;
    }

    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Vec<Question> {
        INTERVIEW_SHAPE
            .iter()
            .enumerate()
            .map(|(i, d)| Question::new(i as i32 + 10, *d, format!("q{}", i)))
            .collect()
    }

    #[test]
    fn finalize_is_write_once() {
        let mut q = Question::new(1, Difficulty::Easy, "What is a closure?");
        q.finalize("a function with captured state".into(), 5, 7).unwrap();
        assert!(q.is_sealed());

        let err = q.finalize("overwrite".into(), 1, 10).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(q.answer(), Some("a function with captured state"));
        assert_eq!(q.time_used(), Some(5));
        assert_eq!(q.score(), Some(7));
    }

    #[test]
    fn finalize_clamps_time_and_score() {
        let mut q = Question::new(1, Difficulty::Easy, "prompt");
        q.finalize("x".into(), 95, 14).unwrap();
        assert_eq!(q.time_used(), Some(20));
        assert_eq!(q.score(), Some(10));
    }

    #[test]
    fn validate_batch_accepts_fixed_shape_and_renumbers() {
        let questions = validate_batch(batch()).unwrap();
        let ids: Vec<i32> = questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        let limits: Vec<u32> = questions.iter().map(|q| q.time_limit).collect();
        assert_eq!(limits, vec![20, 20, 60, 60, 120, 120]);
    }

    #[test]
    fn validate_batch_rejects_wrong_shape() {
        let mut short = batch();
        short.pop();
        assert!(validate_batch(short).is_err());

        let mut swapped = batch();
        swapped.swap(0, 5);
        assert!(validate_batch(swapped).is_err());

        let mut wrong_limit = batch();
        wrong_limit[2].time_limit = 30;
        assert!(validate_batch(wrong_limit).is_err());

        let mut blank = batch();
        blank[1].question = "   ".into();
        assert!(validate_batch(blank).is_err());
    }

    #[test]
    fn unanswered_question_serializes_without_record() {
        let q = Question::new(3, Difficulty::Medium, "Explain middleware");
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["difficulty"], "medium");
        assert_eq!(json["time_limit"], 60);
        assert!(json.get("answer").is_none());
        assert!(json.get("score").is_none());
    }

    #[test]
    fn sealed_question_survives_a_snapshot() {
        let mut q = Question::new(3, Difficulty::Medium, "Explain middleware");
        q.finalize("chain of handlers".into(), 42, 6).unwrap();
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["answer"], "chain of handlers");
        assert_eq!(json["time_used"], 42);

        let restored: Question = serde_json::from_value(json).unwrap();
        assert!(restored.is_sealed());
        assert_eq!(restored, q);
    }
}
