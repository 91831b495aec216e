use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::prelude::{Error, Result};

/// Structured review of one resume. Scores keep the exact JSON number the
/// model produced (`85` stays `85`, never `85.0`) and tip entries are kept
/// verbatim, whatever shape the model gave them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "overallScore")]
    pub overall_score: Number,
    #[serde(rename = "ATS")]
    pub ats: FeedbackSection,
    #[serde(rename = "toneAndStyle")]
    pub tone_and_style: FeedbackSection,
    pub content: FeedbackSection,
    pub structure: FeedbackSection,
    pub skills: FeedbackSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSection {
    pub score: Number,
    pub tips: Vec<Value>,
}

const REQUIRED_FIELDS: [&str; 6] = [
    "overallScore",
    "ATS",
    "toneAndStyle",
    "content",
    "structure",
    "skills",
];

pub const AI_RESPONSE_FORMAT: &str = r#"{
  "overallScore": <number 0-100>,
  "ATS": {
    "score": <number 0-100>,
    "tips": [
      {
        "type": "good" | "improve",
        "tip": "<string>"
      }
    ]
  },
  "toneAndStyle": {
    "score": <number 0-100>,
    "tips": [
      {
        "type": "good" | "improve",
        "tip": "<string - short title>",
        "explanation": "<string - detailed explanation>"
      }
    ]
  },
  "content": {
    "score": <number 0-100>,
    "tips": [
      {
        "type": "good" | "improve",
        "tip": "<string - short title>",
        "explanation": "<string - detailed explanation>"
      }
    ]
  },
  "structure": {
    "score": <number 0-100>,
    "tips": [
      {
        "type": "good" | "improve",
        "tip": "<string - short title>",
        "explanation": "<string - detailed explanation>"
      }
    ]
  },
  "skills": {
    "score": <number 0-100>,
    "tips": [
      {
        "type": "good" | "improve",
        "tip": "<string - short title>",
        "explanation": "<string - detailed explanation>"
      }
    ]
  }
}"#;

pub fn prepare_instructions(job_title: &str, job_description: &str, resume_text: &str) -> String {
    format!(
        r#"You are an expert in ATS (Applicant Tracking System) and resume analysis.
Please analyze and rate this resume for the following position:

Job Title: {job_title}
Job Description: {job_description}

Resume:
{resume_text}

ANALYSIS REQUIREMENTS:
1. Be thorough and detailed in your analysis
2. Don't be afraid to give low scores if the resume needs significant improvement
3. Provide 3-4 actionable tips for each category
4. Consider the job description when evaluating relevance and keyword optimization
5. Focus on both strengths (type: "good") and areas for improvement (type: "improve")

SCORING GUIDELINES:
- overallScore: Overall resume quality (0-100)
- ATS score: Keyword optimization, formatting, and ATS compatibility
- toneAndStyle: Professional language, consistency, and appropriate tone
- content: Relevance, achievements, quantifiable results, and impact
- structure: Organization, readability, visual hierarchy, and formatting
- skills: Technical/soft skills presentation and alignment with job requirements

CRITICAL INSTRUCTIONS:
- Return ONLY a valid JSON object
- Do NOT include markdown code blocks (```json or ```)
- Do NOT include any explanatory text before or after the JSON
- Do NOT include comments in the JSON
- Ensure all strings are properly escaped
- Use the exact structure shown below

REQUIRED JSON FORMAT:
{response_format}

Your response must be PURE JSON starting with {{ and ending with }}. Nothing else."#,
        job_title = job_title,
        job_description = job_description,
        resume_text = resume_text,
        response_format = AI_RESPONSE_FORMAT,
    )
}

/// Pulls the payload out of a markdown code block when the model wrapped
/// its answer in one. A fence without a closing ``` leaves the text as is.
fn strip_code_fences(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let after = &text[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    } else if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    }
    text
}

fn has_numeric_score(section: Option<&Value>) -> bool {
    matches!(
        section.and_then(|s| s.get("score")),
        Some(Value::Number(_))
    )
}

fn extract_section(parsed: &Value, name: &str) -> Result<FeedbackSection> {
    let section = parsed.get(name);
    let score = match section.and_then(|s| s.get("score")) {
        Some(Value::Number(n)) => n.clone(),
        _ => {
            return Err(Error::Feedback(format!(
                "Invalid {name} section: missing or invalid score"
            )))
        }
    };
    let tips = match section.and_then(|s| s.get("tips")) {
        Some(Value::Array(items)) => items.clone(),
        _ => {
            return Err(Error::Feedback(format!(
                "Invalid {name} section: tips must be an array"
            )))
        }
    };
    Ok(FeedbackSection { score, tips })
}

/// Turns a raw model reply into validated [`Feedback`]. The reply may be
/// wrapped in markdown fences; after cleaning it must be a JSON object with
/// a numeric `overallScore` and the five sections, each carrying a numeric
/// `score` and a `tips` array. Tip entries themselves are not validated.
pub fn parse_feedback(raw: &str) -> Result<Feedback> {
    let cleaned = strip_code_fences(raw.trim());

    if !cleaned.starts_with('{') && !cleaned.starts_with('[') {
        return Err(Error::Feedback(
            "AI response is not in JSON format. Please try again.".into(),
        ));
    }

    let parsed: Value = serde_json::from_str(cleaned).map_err(|e| {
        tracing::warn!("feedback body failed to parse: {e}");
        Error::Feedback(
            "Failed to parse AI response as JSON. The AI may not have returned the data in the correct format."
                .into(),
        )
    })?;

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .filter(|field| parsed.get(**field).is_none())
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(Error::Feedback(format!(
            "AI response missing required fields: {}",
            missing.join(", ")
        )));
    }

    let overall_score = match parsed.get("overallScore") {
        Some(Value::Number(n)) => n.clone(),
        _ => {
            return Err(Error::Feedback(
                r#"AI response has invalid "overallScore" (must be a number)"#.into(),
            ))
        }
    };

    if !has_numeric_score(parsed.get("ATS")) {
        return Err(Error::Feedback(
            r#"AI response missing or invalid "ATS.score" field"#.into(),
        ));
    }

    let ats = extract_section(&parsed, "ATS")?;
    let tone_and_style = extract_section(&parsed, "toneAndStyle")?;
    let content = extract_section(&parsed, "content")?;
    let structure = extract_section(&parsed, "structure")?;
    let skills = extract_section(&parsed, "skills")?;

    Ok(Feedback {
        overall_score,
        ats,
        tone_and_style,
        content,
        structure,
        skills,
    })
}

/// Display form of one feedback section, tolerant of whatever made it into
/// the stored tips. Entries without a usable `tip` string are dropped.
#[derive(Debug, Clone)]
pub struct SectionView {
    pub label: &'static str,
    pub score: String,
    pub badge_class: &'static str,
    pub badge_label: &'static str,
    pub tips: Vec<TipView>,
}

#[derive(Debug, Clone)]
pub struct TipView {
    pub good: bool,
    pub title: String,
    pub explanation: String,
}

impl TipView {
    fn from_value(item: &Value) -> Option<TipView> {
        let title = item.get("tip")?.as_str()?.to_string();
        let good = item.get("type").and_then(Value::as_str) == Some("good");
        let explanation = item
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(TipView {
            good,
            title,
            explanation,
        })
    }
}

pub fn score_badge(score: &Number) -> (&'static str, &'static str) {
    let value = score.as_f64().unwrap_or(0.0);
    if value > 69.0 {
        ("badge-green", "Strong")
    } else if value > 49.0 {
        ("badge-yellow", "Good Start")
    } else {
        ("badge-red", "Needs Work")
    }
}

fn section_view(label: &'static str, section: &FeedbackSection) -> SectionView {
    let (badge_class, badge_label) = score_badge(&section.score);
    SectionView {
        label,
        score: section.score.to_string(),
        badge_class,
        badge_label,
        tips: section.tips.iter().filter_map(TipView::from_value).collect(),
    }
}

pub fn section_views(feedback: &Feedback) -> Vec<SectionView> {
    vec![
        section_view("ATS Compatibility", &feedback.ats),
        section_view("Tone & Style", &feedback.tone_and_style),
        section_view("Content", &feedback.content),
        section_view("Structure", &feedback.structure),
        section_view("Skills", &feedback.skills),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> String {
        json!({
            "overallScore": 85,
            "ATS": {"score": 90, "tips": [{"type": "good", "tip": "Clean formatting"}]},
            "toneAndStyle": {"score": 80, "tips": []},
            "content": {"score": 75, "tips": []},
            "structure": {"score": 88, "tips": []},
            "skills": {"score": 70, "tips": []},
        })
        .to_string()
    }

    #[test]
    fn test_parses_bare_json() {
        let feedback = parse_feedback(&valid_body()).unwrap();
        assert_eq!(feedback.overall_score.to_string(), "85");
        assert_eq!(feedback.ats.score.to_string(), "90");
        assert_eq!(feedback.ats.tips.len(), 1);
    }

    #[test]
    fn test_parses_json_fenced_reply() {
        let raw = format!("```json\n{}\n```", valid_body());
        let feedback = parse_feedback(&raw).unwrap();
        assert_eq!(feedback.skills.score.to_string(), "70");
    }

    #[test]
    fn test_parses_generic_fenced_reply_with_prose_around() {
        let raw = format!(
            "Here is your analysis:\n```\n{}\n```\nHope this helps!",
            valid_body()
        );
        assert!(parse_feedback(&raw).is_ok());
    }

    #[test]
    fn test_unterminated_fence_is_left_alone() {
        let raw = format!("```json\n{}", valid_body());
        let err = parse_feedback(&raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "AI response is not in JSON format. Please try again."
        );
    }

    #[test]
    fn test_prose_without_fence_is_not_json() {
        let err = parse_feedback("Your resume looks great overall!").unwrap_err();
        assert_eq!(
            err.to_string(),
            "AI response is not in JSON format. Please try again."
        );
    }

    #[test]
    fn test_malformed_json_reports_parse_failure() {
        let err = parse_feedback("{\"overallScore\": 85,}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to parse AI response as JSON. The AI may not have returned the data in the correct format."
        );
    }

    #[test]
    fn test_missing_fields_are_listed_in_order() {
        let err = parse_feedback(r#"{"overallScore": 85, "content": {}}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "AI response missing required fields: ATS, toneAndStyle, structure, skills"
        );
    }

    #[test]
    fn test_top_level_array_misses_every_field() {
        let err = parse_feedback("[1, 2, 3]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "AI response missing required fields: overallScore, ATS, toneAndStyle, content, structure, skills"
        );
    }

    #[test]
    fn test_overall_score_must_be_numeric() {
        let mut body: Value = serde_json::from_str(&valid_body()).unwrap();
        body["overallScore"] = json!("85");
        let err = parse_feedback(&body.to_string()).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"AI response has invalid "overallScore" (must be a number)"#
        );
    }

    #[test]
    fn test_null_ats_hits_the_dedicated_check() {
        let mut body: Value = serde_json::from_str(&valid_body()).unwrap();
        body["ATS"] = Value::Null;
        let err = parse_feedback(&body.to_string()).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"AI response missing or invalid "ATS.score" field"#
        );
    }

    #[test]
    fn test_non_numeric_section_score() {
        let mut body: Value = serde_json::from_str(&valid_body()).unwrap();
        body["content"]["score"] = json!("75");
        let err = parse_feedback(&body.to_string()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid content section: missing or invalid score"
        );
    }

    #[test]
    fn test_tips_must_be_an_array() {
        let mut body: Value = serde_json::from_str(&valid_body()).unwrap();
        body["toneAndStyle"]["tips"] = json!("none");
        let err = parse_feedback(&body.to_string()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid toneAndStyle section: tips must be an array"
        );
    }

    #[test]
    fn test_missing_tips_key() {
        let mut body: Value = serde_json::from_str(&valid_body()).unwrap();
        body["skills"] = json!({"score": 70});
        let err = parse_feedback(&body.to_string()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid skills section: tips must be an array"
        );
    }

    #[test]
    fn test_tip_entries_survive_verbatim() {
        let mut body: Value = serde_json::from_str(&valid_body()).unwrap();
        body["structure"]["tips"] = json!([{"weird": true}, 42, "just a string"]);
        let feedback = parse_feedback(&body.to_string()).unwrap();
        assert_eq!(feedback.structure.tips, vec![json!({"weird": true}), json!(42), json!("just a string")]);
    }

    #[test]
    fn test_score_number_formatting_is_preserved() {
        let mut body: Value = serde_json::from_str(&valid_body()).unwrap();
        body["overallScore"] = json!(82.5);
        let feedback = parse_feedback(&body.to_string()).unwrap();
        assert_eq!(feedback.overall_score.to_string(), "82.5");

        let serialized = serde_json::to_string(&feedback).unwrap();
        assert!(serialized.contains("\"overallScore\":82.5"));
        assert!(serialized.contains("\"ATS\":"));
        assert!(serialized.contains("\"toneAndStyle\":"));
    }

    #[test]
    fn test_roundtrip_through_storage_json() {
        let feedback = parse_feedback(&valid_body()).unwrap();
        let stored = serde_json::to_string(&feedback).unwrap();
        let reloaded: Feedback = serde_json::from_str(&stored).unwrap();
        assert_eq!(reloaded.overall_score.to_string(), "85");
        assert_eq!(reloaded.ats.tips, feedback.ats.tips);
    }

    #[test]
    fn test_instructions_carry_job_and_resume() {
        let prompt = prepare_instructions("Platform Engineer", "Kubernetes and Rust", "Jane Doe\nSRE at Acme");
        assert!(prompt.contains("Job Title: Platform Engineer"));
        assert!(prompt.contains("Job Description: Kubernetes and Rust"));
        assert!(prompt.contains("Jane Doe\nSRE at Acme"));
        assert!(prompt.contains("REQUIRED JSON FORMAT:"));
        assert!(prompt.contains("Your response must be PURE JSON starting with { and ending with }. Nothing else."));
    }

    #[test]
    fn test_tip_view_reads_known_shape() {
        let tip = TipView::from_value(&json!({
            "type": "improve",
            "tip": "Add metrics",
            "explanation": "Quantify the impact of your work."
        }))
        .unwrap();
        assert!(!tip.good);
        assert_eq!(tip.title, "Add metrics");
        assert_eq!(tip.explanation, "Quantify the impact of your work.");
    }

    #[test]
    fn test_tip_view_tolerates_missing_explanation() {
        let tip = TipView::from_value(&json!({"type": "good", "tip": "Clear headings"})).unwrap();
        assert!(tip.good);
        assert_eq!(tip.explanation, "");
    }

    #[test]
    fn test_unusable_tip_entries_are_dropped() {
        assert!(TipView::from_value(&json!(42)).is_none());
        assert!(TipView::from_value(&json!({"type": "good"})).is_none());
        assert!(TipView::from_value(&json!({"tip": 7})).is_none());
    }

    #[test]
    fn test_section_views_cover_all_five_sections() {
        let feedback = parse_feedback(&valid_body()).unwrap();
        let views = section_views(&feedback);
        assert_eq!(views.len(), 5);
        assert_eq!(views[0].label, "ATS Compatibility");
        assert_eq!(views[0].score, "90");
        assert_eq!(views[0].badge_label, "Strong");
        assert_eq!(views[0].tips.len(), 1);
        assert_eq!(views[4].badge_label, "Strong");
    }

    #[test]
    fn test_score_badge_thresholds() {
        assert_eq!(score_badge(&Number::from(90)).1, "Strong");
        assert_eq!(score_badge(&Number::from(70)).1, "Strong");
        assert_eq!(score_badge(&Number::from(69)).1, "Good Start");
        assert_eq!(score_badge(&Number::from(50)).1, "Good Start");
        assert_eq!(score_badge(&Number::from(49)).1, "Needs Work");
    }
}
