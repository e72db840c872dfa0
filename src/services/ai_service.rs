use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::candidate::{InterviewSummary, Recommendation};
use crate::models::question::{Difficulty, Question};
use crate::services::ai_contract::{
    AnswerEvaluator, Evaluation, EvaluationRequest, QuestionGenerator, SummaryGenerator,
    SummaryRequest,
};

/// Chat-completions client backing the question generator, answer evaluator and
/// summary generator.
#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GeneratedBatch {
    questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestion {
    difficulty: Difficulty,
    question: String,
    #[serde(alias = "timeLimit")]
    time_limit: u32,
}

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    score: f64,
    #[serde(default)]
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct RawSummary {
    #[serde(alias = "overallScore")]
    overall_score: f64,
    summary: String,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
    recommendation: String,
}

impl AIService {
    pub fn new(
        api_key: Option<String>,
        base_url: String,
        model: String,
        request_timeout: Duration,
        client: Client,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            request_timeout,
        }
    }

    async fn chat_completion(&self, prompt: String, temperature: f32) -> Result<JsonValue> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::ExternalService("OPENAI_API_KEY is not configured".to_string()))?;

        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "response_format": { "type": "json_object" },
            "temperature": temperature
        });

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::ExternalService(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            tracing::error!(%status, "Chat completion request rejected");
            return Err(Error::ExternalService(format!("API error {}: {}", status, text)));
        }

        let body: JsonValue = res
            .json()
            .await
            .map_err(|e| Error::ExternalService(e.to_string()))?;

        let content = body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| Error::ExternalService("Invalid chat completion format".to_string()))?;

        extract_json_object(content)
    }
}

/// Parses the outermost `{...}` block of a model reply, ignoring any prose around it.
pub fn extract_json_object(text: &str) -> Result<JsonValue> {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&text[start..=end])
            .map_err(|e| Error::ExternalService(format!("Malformed JSON in reply: {}", e))),
        _ => Err(Error::ExternalService("No JSON object in reply".to_string())),
    }
}

fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 10.0) as u8
}

fn parse_recommendation(raw: &str) -> Result<Recommendation> {
    match raw.trim().to_lowercase().as_str() {
        "hire" => Ok(Recommendation::Hire),
        "consider" => Ok(Recommendation::Consider),
        "reject" => Ok(Recommendation::Reject),
        other => Err(Error::ExternalService(format!("Unknown recommendation '{}'", other))),
    }
}

#[async_trait]
impl QuestionGenerator for AIService {
    async fn generate_questions(&self, role: &str) -> Result<Vec<Question>> {
        let prompt = format!(
            r#"Generate 6 interview questions for a {role} position.
Return EXACTLY 6 questions in this JSON format:
{{
  "questions": [
    {{"id": 1, "difficulty": "easy", "question": "question text", "timeLimit": 20}},
    {{"id": 2, "difficulty": "easy", "question": "question text", "timeLimit": 20}},
    {{"id": 3, "difficulty": "medium", "question": "question text", "timeLimit": 60}},
    {{"id": 4, "difficulty": "medium", "question": "question text", "timeLimit": 60}},
    {{"id": 5, "difficulty": "hard", "question": "question text", "timeLimit": 120}},
    {{"id": 6, "difficulty": "hard", "question": "question text", "timeLimit": 120}}
  ]
}}

Requirements:
- 2 Easy questions (20 seconds each): basic concepts, syntax
- 2 Medium questions (60 seconds each): problem-solving, implementation
- 2 Hard questions (120 seconds each): complex scenarios, architecture
- Questions should be practical and relevant to the role"#
        );

        let resp = self.chat_completion(prompt, 0.8).await?;
        let batch: GeneratedBatch = serde_json::from_value(resp)
            .map_err(|e| Error::ExternalService(format!("Unexpected question batch: {}", e)))?;

        tracing::info!(count = batch.questions.len(), "Question batch received");

        Ok(batch
            .questions
            .into_iter()
            .enumerate()
            .map(|(idx, q)| {
                let mut question = Question::new(idx as i32 + 1, q.difficulty, q.question);
                question.time_limit = q.time_limit;
                question
            })
            .collect())
    }
}

#[async_trait]
impl AnswerEvaluator for AIService {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation> {
        let prompt = format!(
            r#"Evaluate this interview answer:

Question: "{}"
Answer: "{}"
Time Used: {} seconds out of {} seconds

Provide a score from 0-10 and brief feedback in this JSON format:
{{"score": 8, "feedback": "Good explanation of concepts, could be more detailed in implementation"}}

Consider technical accuracy, completeness, time management and clarity."#,
            request.question, request.answer, request.time_used, request.time_limit
        );

        let resp = self.chat_completion(prompt, 0.2).await?;
        let raw: RawEvaluation = serde_json::from_value(resp)
            .map_err(|e| Error::ExternalService(format!("Unexpected evaluation: {}", e)))?;

        Ok(Evaluation {
            score: clamp_score(raw.score),
            feedback: raw.feedback.trim().to_string(),
        })
    }
}

#[async_trait]
impl SummaryGenerator for AIService {
    async fn summarize(&self, request: &SummaryRequest) -> Result<InterviewSummary> {
        let total: u32 = request
            .questions
            .iter()
            .map(|q| q.score().unwrap_or(0) as u32)
            .sum();
        let average = if request.questions.is_empty() {
            0.0
        } else {
            total as f64 / request.questions.len() as f64
        };
        let listing = request
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                format!(
                    "{}. {} - Score: {}/10",
                    i + 1,
                    q.question,
                    q.score().unwrap_or(0)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let candidate = &request.candidate;

        let prompt = format!(
            r#"Generate a final interview summary for this candidate:

Candidate: {}
Email: {}
Phone: {}
Average Score: {:.1}/10

Questions and Scores:
{}

Provide a comprehensive summary in this JSON format:
{{
  "overallScore": {},
  "summary": "2-3 sentence summary of candidate performance",
  "strengths": ["strength1", "strength2"],
  "improvements": ["area1", "area2"],
  "recommendation": "hire/consider/reject"
}}"#,
            candidate.name,
            candidate.email.as_deref().unwrap_or("-"),
            candidate.phone.as_deref().unwrap_or("-"),
            average,
            listing,
            average.round() as u8
        );

        let resp = self.chat_completion(prompt, 0.4).await?;
        let raw: RawSummary = serde_json::from_value(resp)
            .map_err(|e| Error::ExternalService(format!("Unexpected summary: {}", e)))?;

        Ok(InterviewSummary {
            overall_score: clamp_score(raw.overall_score),
            summary: raw.summary,
            strengths: raw.strengths,
            improvements: raw.improvements,
            recommendation: parse_recommendation(&raw.recommendation)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_wrapped_in_prose() {
        let reply = "Sure! Here you go:\n```json\n{\"score\": 7, \"feedback\": \"ok\"}\n```";
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value["score"], 7);
    }

    #[test]
    fn rejects_reply_without_json() {
        assert!(extract_json_object("I cannot help with that").is_err());
        assert!(extract_json_object("} backwards {").is_err());
    }

    #[test]
    fn parses_camel_case_batch() {
        let value = serde_json::json!({
            "questions": [{"id": 1, "difficulty": "easy", "question": "q", "timeLimit": 20}]
        });
        let batch: GeneratedBatch = serde_json::from_value(value).unwrap();
        assert_eq!(batch.questions[0].time_limit, 20);
        assert_eq!(batch.questions[0].difficulty, Difficulty::Easy);
    }

    #[test]
    fn recommendation_parsing_is_lenient_on_case() {
        assert_eq!(parse_recommendation(" Hire ").unwrap(), Recommendation::Hire);
        assert!(parse_recommendation("hire/consider/reject").is_err());
    }

    #[tokio::test]
    async fn missing_api_key_is_an_external_service_error() {
        let service = AIService::new(
            None,
            "http://localhost:9".to_string(),
            "gpt-4o-mini".to_string(),
            Duration::from_secs(1),
            Client::new(),
        );
        let err = service.generate_questions("Backend").await.unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
    }
}
