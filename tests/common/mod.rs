#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use interview_orchestrator::error::{Error, Result};
use interview_orchestrator::models::candidate::{Candidate, InterviewSummary};
use interview_orchestrator::models::question::Question;
use interview_orchestrator::services::ai_contract::{
    fallback_questions, AnswerEvaluator, Evaluation, EvaluationRequest, QuestionGenerator,
    SummaryGenerator, SummaryRequest,
};
use interview_orchestrator::services::orchestrator_service::{
    Collaborators, InterviewHandle, InterviewOrchestrator, OrchestratorSettings, SessionView,
};
use interview_orchestrator::services::store_service::{MemorySessionStore, SessionStore};

pub const AI_TIMEOUT: Duration = Duration::from_secs(45);

pub struct FixedGenerator;

#[async_trait]
impl QuestionGenerator for FixedGenerator {
    async fn generate_questions(&self, _role: &str) -> Result<Vec<Question>> {
        Ok(fallback_questions())
    }
}

/// Hands out the scripted scores in order and records every request.
#[derive(Default)]
pub struct ScriptedEvaluator {
    scores: Mutex<VecDeque<u8>>,
    delay: Option<Duration>,
    pub requests: Mutex<Vec<EvaluationRequest>>,
}

impl ScriptedEvaluator {
    pub fn new(scores: impl IntoIterator<Item = u8>) -> Self {
        Self {
            scores: Mutex::new(scores.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn delayed(scores: impl IntoIterator<Item = u8>, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(scores)
        }
    }

    pub fn requests(&self) -> Vec<EvaluationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerEvaluator for ScriptedEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let score = self
            .scores
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::ExternalService("no scripted score left".into()))?;
        Ok(Evaluation {
            score,
            feedback: "Good".into(),
        })
    }
}

pub struct OfflineSummarizer;

#[async_trait]
impl SummaryGenerator for OfflineSummarizer {
    async fn summarize(&self, _request: &SummaryRequest) -> Result<InterviewSummary> {
        Err(Error::ExternalService("summary service unavailable".into()))
    }
}

/// Fails like `OfflineSummarizer`, but only after `delay`.
pub struct SlowSummarizer {
    pub delay: Duration,
}

#[async_trait]
impl SummaryGenerator for SlowSummarizer {
    async fn summarize(&self, _request: &SummaryRequest) -> Result<InterviewSummary> {
        tokio::time::sleep(self.delay).await;
        Err(Error::ExternalService("summary service unavailable".into()))
    }
}

pub fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        role: "Full Stack Developer".into(),
        ai_timeout: AI_TIMEOUT,
    }
}

pub fn collaborators(evaluator: Arc<ScriptedEvaluator>) -> Collaborators {
    Collaborators {
        generator: Arc::new(FixedGenerator),
        evaluator,
        summarizer: Arc::new(OfflineSummarizer),
    }
}

pub async fn spawn(
    store: &MemorySessionStore,
    evaluator: Arc<ScriptedEvaluator>,
) -> InterviewHandle {
    spawn_with(store, collaborators(evaluator)).await
}

pub async fn spawn_with(
    store: &MemorySessionStore,
    collaborators: Collaborators,
) -> InterviewHandle {
    let store: Arc<dyn SessionStore> = Arc::new(store.clone());
    InterviewOrchestrator::spawn(settings(), collaborators, store)
        .await
        .expect("spawn orchestrator")
}

pub async fn begin(handle: &InterviewHandle, name: &str) -> SessionView {
    handle
        .begin_interview(Candidate::new(name.into(), None, None))
        .await
        .expect("begin interview")
}

pub async fn wait_until(
    handle: &InterviewHandle,
    predicate: impl FnMut(&SessionView) -> bool,
) -> SessionView {
    let mut rx = handle.subscribe();
    let view = rx.wait_for(predicate).await.expect("orchestrator stopped").clone();
    view
}
