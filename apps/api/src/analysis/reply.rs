//! Best-effort extraction of an `AnalysisResult` from free-form model text.
//!
//! Strategies, in order: direct parse, fenced block, each balanced `{...}`
//! from left to right, greedy first-`{`-to-last-`}` span. Callers fall back to `fallback_result()`
//! when every strategy fails.

use serde::Deserialize;
use serde_json::Value;

use crate::analysis::models::{normalize_score, AnalysisResult, BulletImprovement};
use crate::llm_client::strip_json_fences;

/// The reply shape the prompt asks for. Scores arrive as numbers or numeric
/// strings (sometimes with a trailing `%`), so they are read as raw JSON.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReply {
    ats_score: Value,
    #[serde(default)]
    improvements: Vec<BulletImprovement>,
    cover_letter: String,
}

pub fn parse_model_reply(text: &str) -> Option<AnalysisResult> {
    [text.trim(), strip_json_fences(text)]
        .into_iter()
        .chain(balanced_objects(text))
        .chain(greedy_object_span(text))
        .find_map(try_parse)
}

/// The canned result returned when the model reply is unusable.
pub fn fallback_result() -> AnalysisResult {
    let improvement = |original: &str, improved: &str| BulletImprovement {
        original: original.to_string(),
        improved: improved.to_string(),
    };

    AnalysisResult {
        ats_score: 85,
        improvements: vec![
            improvement(
                "Worked on projects",
                "Developed 5+ scalable web applications using React.js and Node.js, increasing user engagement by 40%",
            ),
            improvement(
                "Tested applications",
                "Implemented comprehensive testing strategies using Jest and Cypress, reducing production bugs by 60%",
            ),
            improvement(
                "Collaborated with team",
                "Led cross-functional collaboration with 8-person development team, delivering projects 25% ahead of schedule",
            ),
        ],
        cover_letter: "Dear Hiring Manager,\n\nI am excited to apply for this position. \
            My experience aligns perfectly with your requirements...\n\nBest regards"
            .to_string(),
    }
}

fn try_parse(candidate: &str) -> Option<AnalysisResult> {
    let reply: ModelReply = serde_json::from_str(candidate).ok()?;
    let ats_score = score_from_value(&reply.ats_score)?;
    if reply.cover_letter.trim().is_empty() {
        return None;
    }
    Some(AnalysisResult {
        ats_score,
        improvements: reply
            .improvements
            .into_iter()
            .filter(|i| !i.original.trim().is_empty() || !i.improved.trim().is_empty())
            .collect(),
        cover_letter: reply.cover_letter,
    })
}

fn score_from_value(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    normalize_score(raw)
}

/// Every `{...}` span whose braces balance, in order of its opening brace.
/// Braces inside JSON strings are ignored.
fn balanced_objects(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('{')
        .filter_map(move |(start, _)| balanced_object_at(text, start))
}

fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn greedy_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
