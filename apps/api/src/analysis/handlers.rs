//! Axum route handlers for the Analysis API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::analysis::pipeline::{run_analysis, AnalysisRequest, AnalyzeResponse};
use crate::auth::token::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub resume_text: String,
    pub job_description: String,
    #[serde(default)]
    pub save: bool,
}

/// POST /api/v1/analyze
///
/// Spends one credit and returns the model's analysis, labelled `success` or
/// `degraded`. With `save: true` a successful analysis is added to history.
pub async fn handle_analyze(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let response = run_analysis(
        state.credits.as_ref(),
        state.analyzer.as_ref(),
        state.analyses.as_ref(),
        AnalysisRequest {
            user_id: user.id,
            resume_text: &req.resume_text,
            job_description: &req.job_description,
            save: req.save,
        },
    )
    .await?;

    Ok(Json(response))
}
