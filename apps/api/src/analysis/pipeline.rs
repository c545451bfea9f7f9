//! Analysis pipeline: validate, consume a credit, analyze, optionally persist.
//!
//! The credit is taken before the model call and is not refunded on failure.
//! Degraded results are returned to the caller but never persisted. A failed
//! save is logged and reported as `saved: false`; the analysis is still returned.

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::analysis::analyzer::ResumeAnalyzer;
use crate::analysis::models::{AnalysisOutcome, AnalysisResult, AnalysisStatus};
use crate::credits::ledger::CreditLedger;
use crate::errors::AppError;
use crate::history::repository::{AnalysisRepository, NewAnalysis};

/// Upper bound on either input, in characters.
pub const MAX_INPUT_CHARS: usize = 50_000;

pub struct AnalysisRequest<'a> {
    pub user_id: Uuid,
    pub resume_text: &'a str,
    pub job_description: &'a str,
    pub save: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub result: AnalysisResult,
    /// Set when the result was saved to history.
    pub analysis_id: Option<Uuid>,
    pub saved: bool,
    pub credits_remaining: i32,
}

pub async fn run_analysis(
    credits: &dyn CreditLedger,
    analyzer: &dyn ResumeAnalyzer,
    analyses: &dyn AnalysisRepository,
    request: AnalysisRequest<'_>,
) -> Result<AnalyzeResponse, AppError> {
    validate_inputs(request.resume_text, request.job_description)?;

    let credits_remaining = credits
        .try_consume(request.user_id)
        .await?
        .ok_or(AppError::NoCredits)?;
    info!(
        "Analyzing resume for user {} ({} credits left)",
        request.user_id, credits_remaining
    );

    let outcome = analyzer
        .analyze(request.resume_text, request.job_description)
        .await
        .map_err(|e| AppError::Llm(format!("Resume analysis failed: {e}")))?;

    let analysis_id = match (&outcome, request.save) {
        (AnalysisOutcome::Success(result), true) => {
            let saved = analyses
                .insert(NewAnalysis {
                    user_id: request.user_id,
                    resume_text: request.resume_text,
                    job_description: request.job_description,
                    result,
                })
                .await;
            match saved {
                Ok(row) => Some(row.id),
                Err(e) => {
                    error!(
                        "Failed to save analysis for user {}: {e}",
                        request.user_id
                    );
                    None
                }
            }
        }
        _ => None,
    };

    info!(
        "Analysis for user {} finished: status={:?}, ats_score={}, saved={}",
        request.user_id,
        outcome.status(),
        outcome.result().ats_score,
        analysis_id.is_some()
    );

    Ok(AnalyzeResponse {
        status: outcome.status(),
        reason: outcome.reason().map(str::to_string),
        result: outcome.result().clone(),
        saved: analysis_id.is_some(),
        analysis_id,
        credits_remaining,
    })
}

fn validate_inputs(resume_text: &str, job_description: &str) -> Result<(), AppError> {
    for (name, value) in [("resumeText", resume_text), ("jobDescription", job_description)] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{name} cannot be empty")));
        }
        if value.chars().count() > MAX_INPUT_CHARS {
            return Err(AppError::Validation(format!(
                "{name} must be at most {MAX_INPUT_CHARS} characters"
            )));
        }
    }
    Ok(())
}
