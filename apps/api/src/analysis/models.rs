use serde::{Deserialize, Serialize};

pub const MIN_ATS_SCORE: u8 = 0;
pub const MAX_ATS_SCORE: u8 = 100;

/// A single resume bullet and its rewrite tailored to the job description.
///
/// Older prompts asked the model for `before` / `after`; both spellings are
/// accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletImprovement {
    #[serde(alias = "before")]
    pub original: String,
    #[serde(alias = "after")]
    pub improved: String,
}

/// A complete analysis as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub ats_score: u8,
    pub improvements: Vec<BulletImprovement>,
    pub cover_letter: String,
}

/// Whether an analysis came from the model or is a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The model answered with a usable analysis.
    Success(AnalysisResult),
    /// The model answered but nothing usable could be extracted;
    /// `fallback` is the canned result.
    Degraded {
        reason: String,
        fallback: AnalysisResult,
    },
}

impl AnalysisOutcome {
    pub fn result(&self) -> &AnalysisResult {
        match self {
            AnalysisOutcome::Success(result) => result,
            AnalysisOutcome::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn status(&self) -> AnalysisStatus {
        match self {
            AnalysisOutcome::Success(_) => AnalysisStatus::Success,
            AnalysisOutcome::Degraded { .. } => AnalysisStatus::Degraded,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Success(_) => None,
            AnalysisOutcome::Degraded { reason, .. } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Success,
    Degraded,
}

/// Clamps a raw model score into the ATS range, rounding fractions.
pub fn normalize_score(raw: f64) -> Option<u8> {
    if !raw.is_finite() {
        return None;
    }
    let clamped = raw
        .round()
        .clamp(f64::from(MIN_ATS_SCORE), f64::from(MAX_ATS_SCORE));
    Some(clamped as u8)
}
