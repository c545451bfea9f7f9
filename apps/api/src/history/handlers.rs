//! Axum route handlers for the History API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::analysis::pipeline::{run_analysis, AnalysisRequest, AnalyzeResponse};
use crate::auth::token::AuthUser;
use crate::errors::AppError;
use crate::history::repository::{HistoryParams, HistoryQuery};
use crate::models::analysis::{AnalysisSummary, ResumeAnalysisRow};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RerunRequest {
    #[serde(default)]
    pub save: bool,
}

/// GET /api/v1/history?search=&limit=&offset=
///
/// Newest first. `search` matches the job description or resume text.
pub async fn handle_list_history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<AnalysisSummary>>, AppError> {
    let query = HistoryQuery::from(params);
    let rows = state.analyses.list(user.id, &query).await?;
    Ok(Json(rows.iter().map(AnalysisSummary::from).collect()))
}

/// GET /api/v1/history/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeAnalysisRow>, AppError> {
    let row = find_owned(&state, user.id, id).await?;
    Ok(Json(row))
}

/// DELETE /api/v1/history/:id
pub async fn handle_delete_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.analyses.delete(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Analysis {id} not found")))
    }
}

/// POST /api/v1/history/:id/rerun
///
/// Analyzes the saved resume and job description again. Costs one credit,
/// exactly like a fresh analysis. The body is optional; without it the new
/// result is not saved.
pub async fn handle_rerun_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    req: Option<Json<RerunRequest>>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let row = find_owned(&state, user.id, id).await?;

    let response = run_analysis(
        state.credits.as_ref(),
        state.analyzer.as_ref(),
        state.analyses.as_ref(),
        AnalysisRequest {
            user_id: user.id,
            resume_text: &row.resume_text,
            job_description: &row.job_description,
            save: req.save,
        },
    )
    .await?;

    Ok(Json(response))
}

async fn find_owned(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<ResumeAnalysisRow, AppError> {
    state
        .analyses
        .get(user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))
}
