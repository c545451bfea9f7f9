// Prompt constants for resume analysis.
// Reuses the JSON-only system instruction from llm_client::prompts.

/// Analysis prompt template. Replace `{resume_text}` and `{job_description}` before sending.
pub const ANALYZE_PROMPT_TEMPLATE: &str = r#"Analyze this resume against the job description and provide:
1. An ATS compatibility score (0-100)
2. Three specific improvements for resume bullets, each pairing an original bullet from the resume with an improved version tailored to the job
3. A short cover letter tailored to this job

Resume:
{resume_text}

Job Description:
{job_description}

Respond with a JSON object with this EXACT structure:
{
  "atsScore": 85,
  "improvements": [
    {"original": "original bullet", "improved": "improved bullet"},
    {"original": "original bullet", "improved": "improved bullet"},
    {"original": "original bullet", "improved": "improved bullet"}
  ],
  "coverLetter": "cover letter text"
}

Only respond with the JSON object, no other text."#;

pub fn build_analyze_prompt(resume_text: &str, job_description: &str) -> String {
    fill_template(
        ANALYZE_PROMPT_TEMPLATE,
        &[
            ("{resume_text}", resume_text.trim()),
            ("{job_description}", job_description.trim()),
        ],
    )
}

/// Substitutes placeholders in one pass over the template. Inserted values are
/// never scanned again, so user text containing a placeholder stays literal.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some((at, placeholder, value)) = values
        .iter()
        .filter_map(|&(placeholder, value)| {
            rest.find(placeholder).map(|at| (at, placeholder, value))
        })
        .min_by_key(|&(at, _, _)| at)
    {
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + placeholder.len()..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_both_texts() {
        let prompt = build_analyze_prompt("  Rust engineer, 5 years  ", "Senior Rust role");
        assert!(prompt.contains("Resume:\nRust engineer, 5 years\n"));
        assert!(prompt.contains("Job Description:\nSenior Rust role\n"));
        assert!(!prompt.contains("{resume_text}"));
        assert!(!prompt.contains("{job_description}"));
    }

    #[test]
    fn test_placeholder_inside_resume_is_not_expanded() {
        let prompt = build_analyze_prompt("I know {job_description} syntax", "SECRET JD");
        assert!(prompt.contains("Resume:\nI know {job_description} syntax\n"));
        assert!(!prompt.contains("I know SECRET JD syntax"));
        assert!(prompt.contains("Job Description:\nSECRET JD\n"));
    }
}
