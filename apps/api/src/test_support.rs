//! In-memory stand-ins for the database, model and auth provider, used by
//! handler tests to drive the real router.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{body::to_bytes, response::Response, Router};
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::analysis::analyzer::ResumeAnalyzer;
use crate::analysis::models::{AnalysisOutcome, AnalysisResult, BulletImprovement};
use crate::analysis::reply::fallback_result;
use crate::auth::provider::{AuthProvider, AuthProviderError, Session, SessionUser, SignUpOutcome};
use crate::auth::token::tests::{claims_for, sign, SECRET};
use crate::auth::token::TokenVerifier;
use crate::credits::ledger::CreditLedger;
use crate::errors::AppError;
use crate::history::repository::{AnalysisRepository, HistoryQuery, NewAnalysis};
use crate::llm_client::LlmError;
use crate::models::analysis::ResumeAnalysisRow;
use crate::routes::build_router;
use crate::state::AppState;

pub fn sample_result(ats_score: u8) -> AnalysisResult {
    AnalysisResult {
        ats_score,
        improvements: vec![BulletImprovement {
            original: "Worked on backend services".to_string(),
            improved: "Built Rust services handling 20k requests per second".to_string(),
        }],
        cover_letter: "Dear Hiring Manager,\n\nI am excited to apply.".to_string(),
    }
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ────────────────────────────────────────────────────────────────────────────
// Analyses
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryAnalyses {
    rows: Mutex<Vec<ResumeAnalysisRow>>,
}

#[async_trait]
impl AnalysisRepository for InMemoryAnalyses {
    async fn insert(&self, analysis: NewAnalysis<'_>) -> Result<ResumeAnalysisRow, AppError> {
        let row = ResumeAnalysisRow {
            id: Uuid::new_v4(),
            user_id: analysis.user_id,
            resume_text: analysis.resume_text.to_string(),
            job_description: analysis.job_description.to_string(),
            ats_score: i32::from(analysis.result.ats_score),
            improvements: Json(analysis.result.improvements.clone()),
            cover_letter: analysis.result.cover_letter.clone(),
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list(
        &self,
        user_id: Uuid,
        query: &HistoryQuery,
    ) -> Result<Vec<ResumeAnalysisRow>, AppError> {
        let needle = query.search.as_deref().map(str::to_lowercase);
        let mut rows: Vec<ResumeAnalysisRow> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .filter(|r| match &needle {
                Some(n) => {
                    r.job_description.to_lowercase().contains(n)
                        || r.resume_text.to_lowercase().contains(n)
                }
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(rows
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<ResumeAnalysisRow>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && r.user_id == user_id)
            .cloned())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(rows.len() < before)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Credits
// ────────────────────────────────────────────────────────────────────────────

pub struct InMemoryCredits {
    default_credits: i32,
    balances: Mutex<HashMap<Uuid, i32>>,
}

impl InMemoryCredits {
    pub fn new(default_credits: i32) -> Self {
        Self {
            default_credits,
            balances: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CreditLedger for InMemoryCredits {
    async fn balance(&self, user_id: Uuid) -> Result<i32, AppError> {
        let mut balances = self.balances.lock().unwrap();
        Ok(*balances.entry(user_id).or_insert(self.default_credits))
    }

    async fn try_consume(&self, user_id: Uuid) -> Result<Option<i32>, AppError> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(user_id).or_insert(self.default_credits);
        if *balance <= 0 {
            return Ok(None);
        }
        *balance -= 1;
        Ok(Some(*balance))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

enum StubReply {
    Outcome(AnalysisOutcome),
    Failure,
}

pub struct StubAnalyzer {
    reply: StubReply,
    calls: AtomicUsize,
}

impl StubAnalyzer {
    fn with_reply(reply: StubReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn success(result: AnalysisResult) -> Self {
        Self::with_reply(StubReply::Outcome(AnalysisOutcome::Success(result)))
    }

    pub fn degraded() -> Self {
        Self::with_reply(StubReply::Outcome(AnalysisOutcome::Degraded {
            reason: "The model reply could not be parsed as an analysis".to_string(),
            fallback: fallback_result(),
        }))
    }

    /// Fails the way an exhausted quota does upstream.
    pub fn failing() -> Self {
        Self::with_reply(StubReply::Failure)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResumeAnalyzer for StubAnalyzer {
    async fn analyze(
        &self,
        _resume_text: &str,
        _job_description: &str,
    ) -> Result<AnalysisOutcome, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            StubReply::Outcome(outcome) => Ok(outcome.clone()),
            StubReply::Failure => Err(LlmError::Api {
                status: 429,
                message: "Resource has been exhausted (e.g. check quota).".to_string(),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Auth provider
// ────────────────────────────────────────────────────────────────────────────

pub const REJECTED_PASSWORD: &str = "wrong";

#[derive(Default)]
pub struct StubAuth {
    sign_ups: AtomicUsize,
    sign_outs: AtomicUsize,
    last_full_name: Mutex<Option<String>>,
}

impl StubAuth {
    pub fn sign_ups(&self) -> usize {
        self.sign_ups.load(Ordering::SeqCst)
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    pub fn last_full_name(&self) -> Option<String> {
        self.last_full_name.lock().unwrap().clone()
    }

    fn session(email: &str) -> Session {
        Session {
            access_token: "access-token".to_string(),
            refresh_token: "refresh-token".to_string(),
            expires_in: 3600,
            token_type: "bearer".to_string(),
            user: SessionUser {
                id: Uuid::new_v4(),
                email: Some(email.to_string()),
                full_name: None,
            },
        }
    }
}

#[async_trait]
impl AuthProvider for StubAuth {
    async fn sign_up(
        &self,
        _email: &str,
        _password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthProviderError> {
        self.sign_ups.fetch_add(1, Ordering::SeqCst);
        *self.last_full_name.lock().unwrap() = full_name.map(str::to_string);
        Ok(SignUpOutcome {
            user_id: Some(Uuid::new_v4()),
            confirmation_required: true,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthProviderError> {
        if password == REJECTED_PASSWORD {
            return Err(AuthProviderError::Rejected {
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        }
        Ok(Self::session(email))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<Session, AuthProviderError> {
        Ok(Self::session("ada@example.com"))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthProviderError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// App
// ────────────────────────────────────────────────────────────────────────────

pub struct TestApp {
    pub analyses: Arc<InMemoryAnalyses>,
    pub credits: Arc<InMemoryCredits>,
    pub analyzer: Arc<StubAnalyzer>,
    pub auth: Arc<StubAuth>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(3, StubAnalyzer::success(sample_result(78)))
    }

    pub fn with_default_credits(default_credits: i32) -> Self {
        Self::build(default_credits, StubAnalyzer::success(sample_result(78)))
    }

    pub fn with_failing_analyzer() -> Self {
        Self::build(3, StubAnalyzer::failing())
    }

    fn build(default_credits: i32, analyzer: StubAnalyzer) -> Self {
        Self {
            analyses: Arc::new(InMemoryAnalyses::default()),
            credits: Arc::new(InMemoryCredits::new(default_credits)),
            analyzer: Arc::new(analyzer),
            auth: Arc::new(StubAuth::default()),
        }
    }

    pub fn router(&self) -> Router {
        build_router(AppState {
            analyzer: self.analyzer.clone(),
            analyses: self.analyses.clone(),
            credits: self.credits.clone(),
            auth: self.auth.clone(),
            tokens: TokenVerifier::new(SECRET),
        })
    }

    /// Authorization header value for a signed-in `user_id`.
    pub fn bearer(&self, user_id: Uuid) -> String {
        format!("Bearer {}", sign(&claims_for(user_id), SECRET))
    }

    /// Saves an analysis directly, bypassing the credit ledger.
    pub async fn seed(&self, user_id: Uuid, job_description: &str, ats_score: u8) -> Uuid {
        self.analyses
            .insert(NewAnalysis {
                user_id,
                resume_text: "Rust engineer with 5 years of backend experience",
                job_description,
                result: &sample_result(ats_score),
            })
            .await
            .unwrap()
            .id
    }
}
