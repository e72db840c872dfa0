//! The single owner of the interview session.
//!
//! User commands, countdown ticks and AI completions all arrive on one queue and
//! are applied in order by one task, so no two of them ever observe or mutate
//! the session at the same time.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStatus, InterviewSummary};
use crate::models::message::{Author, Transcript};
use crate::models::question::{Difficulty, Question};
use crate::models::session::SessionStatus;
use crate::services::ai_contract::{
    evaluate_with_fallback, generate_with_fallback, summarize_with_fallback, AiOutcome,
    AnswerEvaluator, Evaluation, QuestionGenerator, SummaryGenerator, SummaryRequest,
};
use crate::services::recovery_service::{RecoveryChoice, RecoveryController, RecoveryOffer};
use crate::services::score_service::{ScoreAggregator, ScoreBoard};
use crate::services::session_service::{Progression, SessionContext, TimerDirective};
use crate::services::store_service::SessionStore;
use crate::services::submission_service::{Arbitrator, Finalized, ManualDecision};
use crate::services::timer_service::{spawn_ticker, Countdown, TickOutcome, TimerTick};

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Role the question generator targets.
    pub role: String,
    /// Upper bound on every AI call; exceeding it counts as a failure.
    pub ai_timeout: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            role: config.interview_role.clone(),
            ai_timeout: Duration::from_secs(config.ai_timeout_secs),
        }
    }
}

#[derive(Clone)]
pub struct Collaborators {
    pub generator: Arc<dyn QuestionGenerator>,
    pub evaluator: Arc<dyn AnswerEvaluator>,
    pub summarizer: Arc<dyn SummaryGenerator>,
}

impl Collaborators {
    /// One service backing all three contracts.
    pub fn shared<S>(service: S) -> Self
    where
        S: QuestionGenerator + AnswerEvaluator + SummaryGenerator + 'static,
    {
        let service = Arc::new(service);
        Self {
            generator: service.clone(),
            evaluator: service.clone(),
            summarizer: service,
        }
    }
}

/// Read model published after every applied command.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionView {
    pub status: SessionStatus,
    pub candidate: Option<Candidate>,
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub current_difficulty: Option<Difficulty>,
    pub current_time_limit: Option<u32>,
    pub time_remaining: u32,
    pub timer_active: bool,
    pub answered: usize,
    pub score: ScoreBoard,
    pub preparing: bool,
    pub evaluating: bool,
    pub transcript: Transcript,
}

impl SessionView {
    fn of(ctx: &SessionContext, preparing: bool, evaluating: bool) -> Self {
        let session = ctx.session();
        let current = session.current_question();
        Self {
            status: session.status(),
            candidate: ctx.candidate().cloned(),
            questions: session.questions().to_vec(),
            current_question_index: session.current_question_index(),
            current_difficulty: current.map(|q| q.difficulty),
            current_time_limit: current.map(|q| q.time_limit),
            time_remaining: session.time_remaining(),
            timer_active: session.timer_active(),
            answered: session.answered_count(),
            score: ScoreAggregator::tally(session.questions()),
            preparing,
            evaluating,
            transcript: session.transcript().clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// This answer sealed the question.
    Finalized {
        question_index: usize,
        score: u8,
        feedback: Option<String>,
        degraded: bool,
        completed: bool,
    },
    /// The question was already sealed, or another answer for it is being evaluated.
    Ignored,
    /// The answer was accepted but the question was sealed by expiry or an abandon
    /// before its evaluation came back.
    Superseded,
}

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
    Begin {
        candidate: Candidate,
        reply: Reply<SessionView>,
    },
    QuestionsReady {
        candidate_id: Uuid,
        outcome: AiOutcome<Vec<Question>>,
    },
    Submit {
        question_index: usize,
        text: String,
        reply: Reply<SubmitOutcome>,
    },
    EvaluationDone {
        token: u64,
        outcome: std::result::Result<AiOutcome<Evaluation>, String>,
    },
    Pause {
        reply: Reply<SessionView>,
    },
    Resume {
        reply: Reply<SessionView>,
    },
    Abandon {
        reply: Reply<SessionView>,
    },
    Offer {
        reply: oneshot::Sender<Option<RecoveryOffer>>,
    },
    Choose {
        choice: RecoveryChoice,
        reply: Reply<SessionView>,
    },
    Tick(TimerTick),
    SummaryDone {
        candidate_id: Uuid,
        outcome: AiOutcome<InterviewSummary>,
    },
}

fn notify(tx: &mpsc::WeakUnboundedSender<Command>, command: Command) {
    if let Some(tx) = tx.upgrade() {
        let _ = tx.send(command);
    }
}

fn welcome_message(name: &str, role: &str) -> String {
    format!(
        "Hello {}! Welcome to your interview for the {} position. You will answer 6 questions: \
         2 easy (20 seconds each), 2 medium (60 seconds each) and 2 hard (120 seconds each). \
         Let's begin!",
        name, role
    )
}

struct PendingBegin {
    candidate: Candidate,
    reply: Reply<SessionView>,
}

struct Orchestrator {
    settings: OrchestratorSettings,
    collaborators: Collaborators,
    store: Arc<dyn SessionStore>,
    ctx: SessionContext,
    countdown: Countdown,
    arbiter: Arbitrator,
    tx: mpsc::WeakUnboundedSender<Command>,
    view_tx: watch::Sender<SessionView>,
    preparing: Option<PendingBegin>,
    waiting: Option<(u64, Reply<SubmitOutcome>)>,
}

pub struct InterviewOrchestrator;

impl InterviewOrchestrator {
    /// Restores the active session from `store`, if any, and starts the task that
    /// owns it. The task stops once every handle has been dropped.
    pub async fn spawn(
        settings: OrchestratorSettings,
        collaborators: Collaborators,
        store: Arc<dyn SessionStore>,
    ) -> Result<InterviewHandle> {
        let ctx = match store.active_session().await? {
            Some(session) => {
                let candidate = match session.candidate_id() {
                    Some(id) => store.get_candidate(id).await?,
                    None => None,
                };
                tracing::info!(
                    candidate_id = ?session.candidate_id(),
                    status = session.status().as_str(),
                    question_index = session.current_question_index(),
                    "Restored persisted interview session"
                );
                SessionContext::restore(session, candidate)
            }
            None => SessionContext::new(),
        };
        let verdict_missing = ctx.session().status() == SessionStatus::Completed
            && ctx
                .candidate()
                .is_some_and(|c| c.status != CandidateStatus::Completed);

        let (tx, rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(SessionView::of(&ctx, false, false));
        let orchestrator = Orchestrator {
            settings,
            collaborators,
            store,
            ctx,
            countdown: Countdown::new(),
            arbiter: Arbitrator::new(),
            tx: tx.downgrade(),
            view_tx,
            preparing: None,
            waiting: None,
        };
        if verdict_missing {
            tracing::warn!("Completed interview has no verdict yet, requesting it again");
            orchestrator.request_summary();
        }
        tokio::spawn(orchestrator.run(rx));

        Ok(InterviewHandle { tx, view: view_rx })
    }
}

impl Orchestrator {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            self.handle(command).await;
        }
        self.countdown.disarm(Instant::now());
        tracing::info!("Interview orchestrator stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Begin { candidate, reply } => self.begin(candidate, reply).await,
            Command::QuestionsReady {
                candidate_id,
                outcome,
            } => self.questions_ready(candidate_id, outcome).await,
            Command::Submit {
                question_index,
                text,
                reply,
            } => self.submit(question_index, &text, reply).await,
            Command::EvaluationDone { token, outcome } => {
                self.evaluation_done(token, outcome).await
            }
            Command::Pause { reply } => {
                let result = self.pause();
                self.commit().await;
                let _ = reply.send(result.map(|_| self.view()));
            }
            Command::Resume { reply } => {
                let result = self.ctx.resume().map(|directive| {
                    if let Some(directive) = directive {
                        self.apply(directive);
                    }
                });
                self.commit().await;
                let _ = reply.send(result.map(|_| self.view()));
            }
            Command::Abandon { reply } => {
                self.abandon().await;
                let _ = reply.send(Ok(self.view()));
            }
            Command::Offer { reply } => {
                let _ = reply.send(RecoveryController::offer(&mut self.ctx));
            }
            Command::Choose { choice, reply } => {
                let result = RecoveryController::choose(&mut self.ctx, choice).map(|directive| {
                    if let Some(directive) = directive {
                        self.apply(directive);
                    }
                });
                if choice == RecoveryChoice::Continue {
                    self.commit().await;
                }
                let _ = reply.send(result.map(|_| self.view()));
            }
            Command::Tick(tick) => self.tick(tick).await,
            Command::SummaryDone {
                candidate_id,
                outcome,
            } => self.summary_done(candidate_id, outcome).await,
        }
    }

    fn view(&self) -> SessionView {
        SessionView::of(
            &self.ctx,
            self.preparing.is_some(),
            self.arbiter.has_pending(),
        )
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }

    async fn persist_session(&self) {
        if let Err(e) = self.store.save_session(self.ctx.session()).await {
            tracing::error!(error = %e, "Failed to persist interview session");
        }
    }

    async fn persist_candidate(&self, candidate: &Candidate) {
        if let Err(e) = self.store.save_candidate(candidate).await {
            tracing::error!(
                candidate_id = %candidate.id,
                error = %e,
                "Failed to persist candidate"
            );
        }
    }

    /// Persists and publishes the state left by a transition.
    async fn commit(&self) {
        if let Some(candidate) = self.ctx.candidate() {
            self.persist_candidate(candidate).await;
        }
        self.persist_session().await;
        self.publish();
    }

    fn apply(&mut self, directive: TimerDirective) {
        let now = Instant::now();
        match directive {
            TimerDirective::Arm {
                question_index,
                time_limit,
                remaining,
            } => {
                let (tick, cancel) = self.countdown.arm(question_index, time_limit, remaining, now);
                let tx = self.tx.clone();
                spawn_ticker(tick, cancel, move |tick| match tx.upgrade() {
                    Some(tx) => tx.send(Command::Tick(tick)).is_ok(),
                    None => false,
                });
            }
            TimerDirective::Disarm => {
                if let Some(remaining) = self.countdown.disarm(now) {
                    self.ctx.session.time_remaining = remaining;
                }
            }
        }
    }

    async fn begin(&mut self, candidate: Candidate, reply: Reply<SessionView>) {
        let refusal = if self.preparing.is_some() {
            Some(Error::invalid_state("an interview is already being prepared"))
        } else if matches!(
            self.ctx.session().status(),
            SessionStatus::InProgress | SessionStatus::Paused
        ) {
            Some(Error::invalid_state(
                "an interview is already active; abandon it before starting another",
            ))
        } else {
            None
        };
        if let Some(e) = refusal {
            let _ = reply.send(Err(e));
            return;
        }

        self.persist_candidate(&candidate).await;
        tracing::info!(candidate_id = %candidate.id, "Requesting interview questions");

        let generator = Arc::clone(&self.collaborators.generator);
        let role = self.settings.role.clone();
        let timeout = self.settings.ai_timeout;
        let tx = self.tx.clone();
        let candidate_id = candidate.id;
        tokio::spawn(async move {
            let outcome = generate_with_fallback(generator.as_ref(), &role, timeout).await;
            notify(
                &tx,
                Command::QuestionsReady {
                    candidate_id,
                    outcome,
                },
            );
        });

        self.preparing = Some(PendingBegin { candidate, reply });
        self.publish();
    }

    async fn questions_ready(&mut self, candidate_id: Uuid, outcome: AiOutcome<Vec<Question>>) {
        let pending = match self.preparing.take() {
            Some(p) if p.candidate.id == candidate_id => p,
            other => {
                self.preparing = other;
                tracing::warn!(%candidate_id, "Discarding questions for an abandoned intake");
                return;
            }
        };
        if let AiOutcome::Fallback { reason, .. } = &outcome {
            tracing::warn!(%reason, "Interview runs on the built-in question set");
        }

        if self.ctx.session().status() == SessionStatus::Completed {
            self.ctx.reset();
        }
        let name = pending.candidate.name.clone();
        let result = self.ctx.start(pending.candidate, outcome.into_value());
        let result = match result {
            Ok(directive) => {
                self.ctx
                    .push_message(Author::Ai, welcome_message(&name, &self.settings.role));
                self.ctx.ask_current_question();
                self.apply(directive);
                self.commit().await;
                Ok(self.view())
            }
            Err(e) => {
                self.publish();
                Err(e)
            }
        };
        let _ = pending.reply.send(result);
    }

    async fn submit(&mut self, question_index: usize, text: &str, reply: Reply<SubmitOutcome>) {
        let decision = self.arbiter.submit_manual(
            &mut self.ctx,
            &mut self.countdown,
            question_index,
            text,
            Instant::now(),
        );
        let (token, request) = match decision {
            Ok(ManualDecision::Dispatch { token, request }) => (token, request),
            Ok(ManualDecision::Ignored) => {
                let _ = reply.send(Ok(SubmitOutcome::Ignored));
                return;
            }
            Err(e) => {
                let _ = reply.send(Err(e));
                return;
            }
        };

        let evaluator = Arc::clone(&self.collaborators.evaluator);
        let timeout = self.settings.ai_timeout;
        let tx = self.tx.clone();
        let job = tokio::spawn(async move {
            evaluate_with_fallback(evaluator.as_ref(), &request, timeout).await
        });
        tokio::spawn(async move {
            let outcome = job.await.map_err(|e| e.to_string());
            notify(&tx, Command::EvaluationDone { token, outcome });
        });

        if let Some((_, earlier)) = self.waiting.replace((token, reply)) {
            let _ = earlier.send(Ok(SubmitOutcome::Superseded));
        }
        self.commit().await;
    }

    async fn evaluation_done(
        &mut self,
        token: u64,
        outcome: std::result::Result<AiOutcome<Evaluation>, String>,
    ) {
        let waiter = match self.waiting.take() {
            Some((waiting_token, reply)) if waiting_token == token => Some(reply),
            other => {
                self.waiting = other;
                None
            }
        };

        let result = match outcome {
            Ok(outcome) => match self.arbiter.complete_manual(&mut self.ctx, token, outcome) {
                Ok(Some(finalized)) => self.progress(finalized).await,
                Ok(None) => Ok(SubmitOutcome::Superseded),
                Err(e) => Err(e),
            },
            Err(reason) => {
                tracing::error!(token, %reason, "Evaluation task failed");
                if let Some(directive) = self.arbiter.abort_manual(&mut self.ctx, token) {
                    self.apply(directive);
                }
                Err(Error::ExternalService(format!(
                    "answer evaluation did not complete: {}",
                    reason
                )))
            }
        };
        self.commit().await;

        if let Some(reply) = waiter {
            let _ = reply.send(result);
        }
    }

    async fn tick(&mut self, tick: TimerTick) {
        match self.countdown.on_tick(tick, Instant::now()) {
            TickOutcome::Stale => {}
            TickOutcome::Running { remaining } => {
                tracing::debug!(remaining, "Countdown tick");
                self.ctx.session.time_remaining = remaining;
                self.persist_session().await;
                self.publish();
            }
            TickOutcome::Expired => {
                match self.arbiter.submit_on_expiry(&mut self.ctx) {
                    Ok(Some(finalized)) => {
                        if let Some((_, reply)) = self.waiting.take() {
                            let _ = reply.send(Ok(SubmitOutcome::Superseded));
                        }
                        if let Err(e) = self.progress(finalized).await {
                            tracing::error!(
                                error = %e,
                                "Interview could not move past an expired question"
                            );
                        }
                    }
                    Ok(None) => {}
                    Err(e) => tracing::error!(error = %e, "Forced submission failed"),
                }
                self.commit().await;
            }
        }
    }

    /// Moves on from a freshly sealed question.
    async fn progress(&mut self, finalized: Finalized) -> Result<SubmitOutcome> {
        let completed = match self.ctx.advance()? {
            Progression::Next(directive) => {
                self.ctx.ask_current_question();
                self.apply(directive);
                false
            }
            Progression::Completed => {
                self.apply(TimerDirective::Disarm);
                self.request_summary();
                true
            }
        };
        Ok(SubmitOutcome::Finalized {
            question_index: finalized.question_index,
            score: finalized.score,
            feedback: finalized.feedback,
            degraded: finalized.degraded,
            completed,
        })
    }

    fn request_summary(&self) {
        let candidate = match self.ctx.candidate() {
            Some(candidate) => candidate.clone(),
            None => {
                tracing::error!("Completed interview has no candidate to summarize");
                return;
            }
        };
        let request = SummaryRequest {
            candidate,
            questions: self.ctx.session().questions().to_vec(),
        };
        let summarizer = Arc::clone(&self.collaborators.summarizer);
        let timeout = self.settings.ai_timeout;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = summarize_with_fallback(summarizer.as_ref(), &request, timeout).await;
            notify(
                &tx,
                Command::SummaryDone {
                    candidate_id: request.candidate.id,
                    outcome,
                },
            );
        });
    }

    async fn summary_done(&mut self, candidate_id: Uuid, outcome: AiOutcome<InterviewSummary>) {
        if let AiOutcome::Fallback { reason, .. } = &outcome {
            tracing::warn!(%reason, "Final verdict computed locally");
        }
        let summary = outcome.into_value();

        let is_current = self.ctx.candidate().map(|c| c.id) == Some(candidate_id)
            && self.ctx.session().status() == SessionStatus::Completed;
        if is_current {
            self.ctx
                .push_message(Author::Ai, ScoreAggregator::completion_message(&summary));
            if let Some(candidate) = self.ctx.candidate.as_mut() {
                ScoreAggregator::apply_summary(candidate, summary);
            }
            tracing::info!(%candidate_id, "Interview verdict recorded");
            self.commit().await;
            return;
        }

        // The session moved on before the verdict arrived; the record still gets it.
        match self.store.get_candidate(candidate_id).await {
            Ok(Some(mut candidate)) => {
                ScoreAggregator::apply_summary(&mut candidate, summary);
                self.persist_candidate(&candidate).await;
            }
            Ok(None) => tracing::warn!(%candidate_id, "Verdict for an unknown candidate dropped"),
            Err(e) => tracing::error!(
                %candidate_id,
                error = %e,
                "Failed to load candidate for verdict"
            ),
        }
    }

    fn pause(&mut self) -> Result<()> {
        if self.arbiter.has_pending() {
            return Err(Error::invalid_state(
                "cannot pause while an answer is being evaluated",
            ));
        }
        let remaining = self.countdown.remaining(Instant::now());
        let directive = self.ctx.pause(remaining)?;
        self.apply(directive);
        Ok(())
    }

    async fn abandon(&mut self) {
        self.countdown.disarm(Instant::now());
        self.arbiter.clear();
        if let Some((_, reply)) = self.waiting.take() {
            let _ = reply.send(Ok(SubmitOutcome::Superseded));
        }
        if let Some(pending) = self.preparing.take() {
            let _ = pending.reply.send(Err(Error::invalid_state(
                "the interview was abandoned before it started",
            )));
        }

        if let Some(candidate) = self.ctx.reset() {
            self.persist_candidate(&candidate).await;
        }
        self.persist_session().await;
        self.publish();
    }
}

/// Cheap, cloneable entry point to the orchestrator task.
#[derive(Clone)]
pub struct InterviewHandle {
    tx: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<SessionView>,
}

impl InterviewHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .map_err(|_| Error::Internal("Interview orchestrator has stopped".to_string()))?;
        rx.await
            .map_err(|_| Error::Internal("Interview orchestrator dropped the request".to_string()))
    }

    /// Generates the question batch and starts the interview for `candidate`.
    /// Replaces a completed session; an active one must be abandoned first.
    pub async fn begin_interview(&self, candidate: Candidate) -> Result<SessionView> {
        self.request(|reply| Command::Begin { candidate, reply })
            .await?
    }

    /// Answers question `question_index`. Resolves once the answer is scored, or
    /// immediately when it is ignored.
    pub async fn submit_answer(
        &self,
        question_index: usize,
        text: impl Into<String>,
    ) -> Result<SubmitOutcome> {
        let text = text.into();
        self.request(|reply| Command::Submit {
            question_index,
            text,
            reply,
        })
        .await?
    }

    pub async fn pause(&self) -> Result<SessionView> {
        self.request(|reply| Command::Pause { reply }).await?
    }

    pub async fn resume(&self) -> Result<SessionView> {
        self.request(|reply| Command::Resume { reply }).await?
    }

    /// Discards the active session. The candidate record is kept.
    pub async fn abandon(&self) -> Result<SessionView> {
        self.request(|reply| Command::Abandon { reply }).await?
    }

    pub async fn recovery_offer(&self) -> Result<Option<RecoveryOffer>> {
        self.request(|reply| Command::Offer { reply }).await
    }

    pub async fn choose_recovery(&self, choice: RecoveryChoice) -> Result<SessionView> {
        self.request(|reply| Command::Choose { choice, reply })
            .await?
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai_contract::{
        fallback_questions, MockAnswerEvaluator, MockQuestionGenerator, MockSummaryGenerator,
    };
    use crate::services::store_service::MemorySessionStore;

    fn settings() -> OrchestratorSettings {
        OrchestratorSettings {
            role: "Backend Engineer".into(),
            ai_timeout: Duration::from_secs(5),
        }
    }

    fn collaborators(evaluator: MockAnswerEvaluator) -> Collaborators {
        let mut generator = MockQuestionGenerator::new();
        generator
            .expect_generate_questions()
            .returning(|_| Ok(fallback_questions()));
        let mut summarizer = MockSummaryGenerator::new();
        summarizer
            .expect_summarize()
            .returning(|_| Err(Error::ExternalService("offline".into())));
        Collaborators {
            generator: Arc::new(generator),
            evaluator: Arc::new(evaluator),
            summarizer: Arc::new(summarizer),
        }
    }

    async fn started(evaluator: MockAnswerEvaluator) -> InterviewHandle {
        let store = Arc::new(MemorySessionStore::new());
        let handle = InterviewOrchestrator::spawn(settings(), collaborators(evaluator), store)
            .await
            .unwrap();
        handle
            .begin_interview(Candidate::new("A".into(), None, None))
            .await
            .unwrap();
        handle
    }

    #[tokio::test(start_paused = true)]
    async fn begin_posts_welcome_and_first_question() {
        let handle = started(MockAnswerEvaluator::new()).await;
        let view = handle.view();

        assert_eq!(view.status, SessionStatus::InProgress);
        assert_eq!(view.time_remaining, 20);
        assert!(view.timer_active);
        let texts: Vec<&str> = view
            .transcript
            .messages()
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert!(texts[0].starts_with("Hello A!"));
        assert!(texts[1].starts_with("Question 1/6 (EASY):"));
    }

    #[tokio::test(start_paused = true)]
    async fn second_begin_while_active_is_rejected() {
        let handle = started(MockAnswerEvaluator::new()).await;
        let err = handle
            .begin_interview(Candidate::new("B".into(), None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(handle.view().candidate.unwrap().name, "A");
    }

    #[tokio::test(start_paused = true)]
    async fn crashed_evaluation_reopens_question() {
        struct Crashing;

        #[async_trait::async_trait]
        impl AnswerEvaluator for Crashing {
            async fn evaluate(
                &self,
                _request: &crate::services::ai_contract::EvaluationRequest,
            ) -> Result<Evaluation> {
                panic!("evaluator crashed")
            }
        }

        let mut collaborators = collaborators(MockAnswerEvaluator::new());
        collaborators.evaluator = Arc::new(Crashing);
        let handle = InterviewOrchestrator::spawn(
            settings(),
            collaborators,
            Arc::new(MemorySessionStore::new()),
        )
        .await
        .unwrap();
        handle
            .begin_interview(Candidate::new("A".into(), None, None))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(4)).await;
        let err = handle.submit_answer(0, "my answer").await.unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));

        let view = handle.view();
        assert_eq!(view.current_question_index, 0);
        assert!(!view.questions[0].is_sealed());
        assert!(view.timer_active);
        assert_eq!(view.time_remaining, 16);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_is_rejected_while_evaluating() {
        let mut evaluator = MockAnswerEvaluator::new();
        evaluator.expect_evaluate().returning(|_| {
            Ok(Evaluation {
                score: 6,
                feedback: "ok".into(),
            })
        });
        let handle = started(evaluator).await;

        let (submitted, paused) = tokio::join!(handle.submit_answer(0, "answer"), handle.pause());
        assert!(matches!(
            submitted.unwrap(),
            SubmitOutcome::Finalized { score: 6, .. }
        ));
        assert!(matches!(paused, Err(Error::InvalidState(_))));
        assert_eq!(handle.view().status, SessionStatus::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_resets_and_keeps_candidate() {
        let handle = started(MockAnswerEvaluator::new()).await;
        let view = handle.abandon().await.unwrap();

        assert_eq!(view.status, SessionStatus::NotStarted);
        assert!(view.candidate.is_none());
        assert!(!view.timer_active);
        assert!(handle
            .begin_interview(Candidate::new("B".into(), None, None))
            .await
            .is_ok());
    }
}
