//! Persistence for saved analyses. Every query is scoped to the owning user.

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::analysis::models::AnalysisResult;
use crate::errors::AppError;
use crate::models::analysis::ResumeAnalysisRow;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw query-string parameters for the history list.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Normalized history list query.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl From<HistoryParams> for HistoryQuery {
    fn from(params: HistoryParams) -> Self {
        Self {
            search: params
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            limit: params
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            offset: params.offset.unwrap_or(0).max(0),
        }
    }
}

pub struct NewAnalysis<'a> {
    pub user_id: Uuid,
    pub resume_text: &'a str,
    pub job_description: &'a str,
    pub result: &'a AnalysisResult,
}

/// Carried in `AppState` as `Arc<dyn AnalysisRepository>`.
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn insert(&self, analysis: NewAnalysis<'_>) -> Result<ResumeAnalysisRow, AppError>;

    /// Newest first.
    async fn list(
        &self,
        user_id: Uuid,
        query: &HistoryQuery,
    ) -> Result<Vec<ResumeAnalysisRow>, AppError>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<ResumeAnalysisRow>, AppError>;

    /// Returns false when no row owned by `user_id` had that id.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

pub struct PgAnalysisRepository {
    pool: PgPool,
}

impl PgAnalysisRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisRepository for PgAnalysisRepository {
    async fn insert(&self, analysis: NewAnalysis<'_>) -> Result<ResumeAnalysisRow, AppError> {
        let row = sqlx::query_as::<_, ResumeAnalysisRow>(
            r#"
            INSERT INTO resume_analyses
                (user_id, resume_text, job_description, ats_score, improvements, cover_letter)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(analysis.user_id)
        .bind(analysis.resume_text)
        .bind(analysis.job_description)
        .bind(i32::from(analysis.result.ats_score))
        .bind(Json(&analysis.result.improvements))
        .bind(&analysis.result.cover_letter)
        .fetch_one(&self.pool)
        .await?;

        info!("Saved analysis {} for user {}", row.id, row.user_id);
        Ok(row)
    }

    async fn list(
        &self,
        user_id: Uuid,
        query: &HistoryQuery,
    ) -> Result<Vec<ResumeAnalysisRow>, AppError> {
        let pattern = query.search.as_deref().map(like_pattern);

        Ok(sqlx::query_as::<_, ResumeAnalysisRow>(
            r#"
            SELECT *
            FROM resume_analyses
            WHERE user_id = $1
              AND ($2::text IS NULL
                   OR job_description ILIKE $2 ESCAPE '\'
                   OR resume_text ILIKE $2 ESCAPE '\')
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(pattern)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<ResumeAnalysisRow>, AppError> {
        Ok(sqlx::query_as::<_, ResumeAnalysisRow>(
            "SELECT * FROM resume_analyses WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM resume_analyses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted analysis {id} for user {user_id}");
        }
        Ok(deleted)
    }
}

/// Wraps a search term for ILIKE, escaping the wildcard characters in it.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
