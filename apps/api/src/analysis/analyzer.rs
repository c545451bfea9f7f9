//! Resume Analyzer: pluggable, trait-based analysis backend.
//!
//! Default: `GeminiAnalyzer` (one model call, best-effort JSON extraction).
//! `AppState` holds an `Arc<dyn ResumeAnalyzer>` so handlers never depend on
//! the concrete model client.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::analysis::models::AnalysisOutcome;
use crate::analysis::prompts::build_analyze_prompt;
use crate::analysis::reply::{fallback_result, parse_model_reply};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError, LlmResponse};

/// Upstream failures (network, provider errors, missing key) are returned as
/// `Err`. A reply that arrives but cannot be used is `Ok(Degraded)`.
#[async_trait]
pub trait ResumeAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<AnalysisOutcome, LlmError>;
}

pub struct GeminiAnalyzer(pub LlmClient);

#[async_trait]
impl ResumeAnalyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<AnalysisOutcome, LlmError> {
        let prompt = build_analyze_prompt(resume_text, job_description);
        let response = self.0.call(&prompt, JSON_ONLY_SYSTEM).await?;
        Ok(outcome_from_response(&response))
    }
}

/// A response with no text (no candidates, or blocked) is degraded.
pub fn outcome_from_response(response: &LlmResponse) -> AnalysisOutcome {
    let Some(text) = response.text() else {
        let finish_reason = response.finish_reason().unwrap_or("UNKNOWN");
        warn!("Model returned no text (finish reason: {finish_reason})");
        return AnalysisOutcome::Degraded {
            reason: format!("The model returned no content (finish reason: {finish_reason})"),
            fallback: fallback_result(),
        };
    };

    interpret_reply(text)
}

/// Turns raw model text into an outcome, falling back to the canned result.
pub fn interpret_reply(text: &str) -> AnalysisOutcome {
    match parse_model_reply(text) {
        Some(result) => {
            info!(
                "Model analysis parsed: ats_score={}, improvements={}",
                result.ats_score,
                result.improvements.len()
            );
            AnalysisOutcome::Success(result)
        }
        None => {
            warn!(
                "Model reply could not be parsed as an analysis ({} chars)",
                text.len()
            );
            AnalysisOutcome::Degraded {
                reason: "The model reply could not be parsed as an analysis".to_string(),
                fallback: fallback_result(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::AnalysisStatus;

    #[test]
    fn test_interpret_reply_success() {
        let outcome = interpret_reply(
            r#"{"atsScore": 66, "improvements": [], "coverLetter": "Dear team"}"#,
        );
        assert_eq!(outcome.status(), AnalysisStatus::Success);
        assert_eq!(outcome.result().ats_score, 66);
        assert!(outcome.reason().is_none());
    }

    #[test]
    fn test_response_without_candidates_is_degraded() {
        let response: LlmResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        let outcome = outcome_from_response(&response);
        assert_eq!(outcome.status(), AnalysisStatus::Degraded);
        assert_eq!(outcome.result(), &fallback_result());
        assert!(outcome.reason().unwrap().contains("UNKNOWN"));
    }

    #[test]
    fn test_safety_blocked_candidate_is_degraded_with_reason() {
        let response: LlmResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        let outcome = outcome_from_response(&response);
        assert_eq!(outcome.status(), AnalysisStatus::Degraded);
        assert!(outcome.reason().unwrap().contains("SAFETY"));
    }

    #[test]
    fn test_response_with_text_is_interpreted() {
        let response: LlmResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "{\"atsScore\": 71, \"coverLetter\": \"Dear team\"}"}]}, "finishReason": "STOP"}]}"#,
        )
        .unwrap();
        let outcome = outcome_from_response(&response);
        assert_eq!(outcome.status(), AnalysisStatus::Success);
        assert_eq!(outcome.result().ats_score, 71);
    }

    #[test]
    fn test_interpret_reply_garbage_is_degraded_fallback() {
        let outcome = interpret_reply("not json at all");
        assert_eq!(outcome.status(), AnalysisStatus::Degraded);
        assert_eq!(outcome.result(), &fallback_result());
        assert!(outcome.reason().is_some());
    }
}
