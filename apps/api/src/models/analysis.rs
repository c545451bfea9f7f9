use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::models::BulletImprovement;

const JOB_TITLE_MAX_CHARS: usize = 80;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_text: String,
    pub job_description: String,
    pub ats_score: i32,
    pub improvements: Json<Vec<BulletImprovement>>,
    pub cover_letter: String,
    pub created_at: DateTime<Utc>,
}

/// One line of the history list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub id: Uuid,
    pub ats_score: i32,
    pub job_title: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ResumeAnalysisRow> for AnalysisSummary {
    fn from(row: &ResumeAnalysisRow) -> Self {
        Self {
            id: row.id,
            ats_score: row.ats_score,
            job_title: job_title(&row.job_description),
            created_at: row.created_at,
        }
    }
}

/// First non-blank line of a job description, truncated for display.
pub fn job_title(job_description: &str) -> String {
    let line = job_description
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();

    if line.chars().count() <= JOB_TITLE_MAX_CHARS {
        return line.to_string();
    }
    let mut title: String = line.chars().take(JOB_TITLE_MAX_CHARS - 1).collect();
    title.push('…');
    title
}
