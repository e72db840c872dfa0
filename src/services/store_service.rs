use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStatus, InterviewSummary};
use crate::models::session::InterviewSession;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSort {
    #[default]
    CreatedAt,
    Name,
    FinalScore,
}

impl CandidateSort {
    fn column(self) -> &'static str {
        match self {
            CandidateSort::CreatedAt => "created_at",
            CandidateSort::Name => "LOWER(name)",
            CandidateSort::FinalScore => "COALESCE(final_score, 0)",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Interviewer-side narrowing of the candidate list. The default lists everyone,
/// newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    /// Case-insensitive substring of the name or email.
    pub search: Option<String>,
    pub status: Option<CandidateStatus>,
    pub sort_by: CandidateSort,
    pub order: SortOrder,
}

impl CandidateFilter {
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, candidate: &Candidate) -> bool {
        if self.status.is_some_and(|status| status != candidate.status) {
            return false;
        }
        match self.needle() {
            Some(needle) => {
                candidate.name.to_lowercase().contains(&needle)
                    || candidate
                        .email
                        .as_deref()
                        .is_some_and(|email| email.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// Ordering of two candidates under this filter. Ties fall back to the id.
    pub fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        let ordering = match self.sort_by {
            CandidateSort::CreatedAt => a.created_at.cmp(&b.created_at),
            CandidateSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            CandidateSort::FinalScore => a
                .final_score
                .unwrap_or(0)
                .cmp(&b.final_score.unwrap_or(0)),
        }
        .then_with(|| a.id.cmp(&b.id));
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Escapes LIKE wildcards so the search term matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Durable home of candidates and the active interview session.
///
/// The orchestrator writes after every transition and every countdown tick, so
/// a restarted process can offer to resume where the previous one stopped.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save_candidate(&self, candidate: &Candidate) -> Result<()>;

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>>;

    async fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>>;

    /// Stores the session and marks it as the active one. A session without a
    /// candidate clears the active marker instead.
    async fn save_session(&self, session: &InterviewSession) -> Result<()>;

    async fn get_session(&self, candidate_id: Uuid) -> Result<Option<InterviewSession>>;

    async fn active_session(&self) -> Result<Option<InterviewSession>>;

    async fn clear_active(&self) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    candidates: HashMap<Uuid, Candidate>,
    sessions: HashMap<Uuid, InterviewSession>,
    active: Option<Uuid>,
}

/// Process-local store. Clones share the same data, so handing a clone to a
/// second orchestrator behaves like a restart over the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save_candidate(&self, candidate: &Candidate) -> Result<()> {
        let mut state = self.inner.write().await;
        state.candidates.insert(candidate.id, candidate.clone());
        Ok(())
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        Ok(self.inner.read().await.candidates.get(&id).cloned())
    }

    async fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>> {
        let state = self.inner.read().await;
        let mut candidates: Vec<Candidate> = state
            .candidates
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| filter.compare(a, b));
        Ok(candidates)
    }

    async fn save_session(&self, session: &InterviewSession) -> Result<()> {
        let mut state = self.inner.write().await;
        match session.candidate_id() {
            Some(id) => {
                state.sessions.insert(id, session.clone());
                state.active = Some(id);
            }
            None => state.active = None,
        }
        Ok(())
    }

    async fn get_session(&self, candidate_id: Uuid) -> Result<Option<InterviewSession>> {
        Ok(self.inner.read().await.sessions.get(&candidate_id).cloned())
    }

    async fn active_session(&self) -> Result<Option<InterviewSession>> {
        let state = self.inner.read().await;
        Ok(state.active.and_then(|id| state.sessions.get(&id).cloned()))
    }

    async fn clear_active(&self) -> Result<()> {
        self.inner.write().await.active = None;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CandidateRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    status: String,
    final_score: Option<i16>,
    summary: Option<Json<InterviewSummary>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = Error;

    fn try_from(row: CandidateRow) -> Result<Self> {
        Ok(Candidate {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            status: row.status.parse()?,
            final_score: row.final_score.map(|s| s.clamp(0, u8::MAX as i16) as u8),
            summary: row.summary.map(|Json(summary)| summary),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const CANDIDATE_COLUMNS: &str =
    "id, name, email, phone, status, final_score, summary, created_at, updated_at";

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn save_candidate(&self, candidate: &Candidate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO interview_candidates
                (id, name, email, phone, status, final_score, summary, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                status = EXCLUDED.status,
                final_score = EXCLUDED.final_score,
                summary = EXCLUDED.summary,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(candidate.id)
        .bind(&candidate.name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(candidate.status.as_str())
        .bind(candidate.final_score.map(i16::from))
        .bind(candidate.summary.as_ref().map(Json))
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let row: Option<CandidateRow> = sqlx::query_as(&format!(
            "SELECT {} FROM interview_candidates WHERE id = $1",
            CANDIDATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Candidate::try_from).transpose()
    }

    async fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>> {
        let mut filters = Vec::new();
        let mut args: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            filters.push(format!("status = ${}", args.len() + 1));
            args.push(status.as_str().to_string());
        }
        if let Some(needle) = filter.needle() {
            let first = args.len() + 1;
            filters.push(format!(
                "(name ILIKE ${} OR COALESCE(email, '') ILIKE ${})",
                first,
                first + 1
            ));
            args.push(like_pattern(&needle));
            args.push(like_pattern(&needle));
        }

        let where_clause = if filters.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", filters.join(" AND "))
        };
        let direction = filter.order.keyword();
        let query = format!(
            "SELECT {} FROM interview_candidates {} ORDER BY {} {}, id {}",
            CANDIDATE_COLUMNS,
            where_clause,
            filter.sort_by.column(),
            direction,
            direction
        );

        let mut statement = sqlx::query_as::<_, CandidateRow>(&query);
        for value in &args {
            statement = statement.bind(value);
        }
        let rows = statement.fetch_all(&self.pool).await?;
        rows.into_iter().map(Candidate::try_from).collect()
    }

    async fn save_session(&self, session: &InterviewSession) -> Result<()> {
        let candidate_id = match session.candidate_id() {
            Some(id) => id,
            None => return self.clear_active().await,
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO interview_sessions (candidate_id, status, snapshot, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (candidate_id) DO UPDATE SET
                status = EXCLUDED.status,
                snapshot = EXCLUDED.snapshot,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(candidate_id)
        .bind(session.status().as_str())
        .bind(Json(session))
        .bind(session.updated_at())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO active_interview (slot, candidate_id, updated_at)
            VALUES (1, $1, NOW())
            ON CONFLICT (slot) DO UPDATE SET
                candidate_id = EXCLUDED.candidate_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(candidate_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_session(&self, candidate_id: Uuid) -> Result<Option<InterviewSession>> {
        let snapshot: Option<Json<InterviewSession>> = sqlx::query_scalar(
            "SELECT snapshot FROM interview_sessions WHERE candidate_id = $1",
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(snapshot.map(|Json(session)| session))
    }

    async fn active_session(&self) -> Result<Option<InterviewSession>> {
        let snapshot: Option<Json<InterviewSession>> = sqlx::query_scalar(
            r#"
            SELECT s.snapshot
            FROM active_interview a
            JOIN interview_sessions s ON s.candidate_id = a.candidate_id
            WHERE a.slot = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(snapshot.map(|Json(session)| session))
    }

    async fn clear_active(&self) -> Result<()> {
        sqlx::query("DELETE FROM active_interview")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
