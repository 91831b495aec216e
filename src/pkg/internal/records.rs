use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::pkg::internal::{ai::feedback::Feedback, kv::KvItem};
use crate::prelude::Result;

pub const RESUME_PREFIX: &str = "resume:";
pub const CLASS_PREFIX: &str = "class:";

pub fn resume_key(id: &str) -> String {
    format!("{}{}", RESUME_PREFIX, id)
}

pub fn class_key(id: &str) -> String {
    format!("{}{}", CLASS_PREFIX, id)
}

/// Glob matching every stored resume record.
pub fn resume_pattern() -> String {
    format!("{}*", RESUME_PREFIX)
}

/// Glob matching every stored class record.
pub fn class_pattern() -> String {
    format!("{}*", CLASS_PREFIX)
}

/// One analyzed resume, stored as a JSON string under `resume:<id>`.
/// Field names follow the stored camelCase wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: String,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub feedback: Feedback,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ResumeRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A review class, stored under `class:<id>`. Student entries are kept
/// as raw values since nothing in the service writes them yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub students: Vec<Value>,
}

impl ClassRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decodes a KV listing into records, newest first. Entries that fail to
/// decode are logged and skipped so one corrupt row cannot take down a
/// listing page. Records without a timestamp sort last.
fn parse_records<T, F>(items: Vec<KvItem>, created_at: F) -> Vec<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    let mut records: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_str(&item.value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("skipping undecodable record at {}: {e}", item.key);
                None
            }
        })
        .collect();
    records.sort_by_key(|record| {
        std::cmp::Reverse(
            created_at(record)
                .map(|ts| ts.timestamp_millis())
                .unwrap_or(0),
        )
    });
    records
}

pub fn parse_resume_listing(items: Vec<KvItem>) -> Vec<ResumeRecord> {
    parse_records(items, |record: &ResumeRecord| record.created_at)
}

pub fn parse_class_listing(items: Vec<KvItem>) -> Vec<ClassRecord> {
    parse_records(items, |record: &ClassRecord| record.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use tracing_test::traced_test;

    fn sample_feedback() -> Feedback {
        serde_json::from_value(json!({
            "overallScore": 85,
            "ATS": {"score": 90, "tips": []},
            "toneAndStyle": {"score": 80, "tips": []},
            "content": {"score": 75, "tips": []},
            "structure": {"score": 88, "tips": []},
            "skills": {"score": 70, "tips": []},
        }))
        .unwrap()
    }

    fn sample_resume(id: &str, ts: Option<DateTime<Utc>>) -> ResumeRecord {
        ResumeRecord {
            id: id.into(),
            resume_path: format!("uploads/{id}/resume.pdf"),
            image_path: format!("uploads/{id}/preview.png"),
            company_name: "Acme".into(),
            job_title: "Platform Engineer".into(),
            job_description: "Rust and Kubernetes".into(),
            feedback: sample_feedback(),
            created_at: ts,
        }
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(resume_key("abc"), "resume:abc");
        assert_eq!(class_key("abc"), "class:abc");
        assert_eq!(resume_pattern(), "resume:*");
        assert_eq!(class_pattern(), "class:*");
    }

    #[test]
    fn test_resume_record_uses_camel_case_wire_format() {
        let record = sample_resume("r1", Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()));
        let stored = record.to_json().unwrap();
        for key in [
            "\"resumePath\"",
            "\"imagePath\"",
            "\"companyName\"",
            "\"jobTitle\"",
            "\"jobDescription\"",
            "\"feedback\"",
            "\"createdAt\"",
            "\"overallScore\"",
        ] {
            assert!(stored.contains(key), "missing {key} in {stored}");
        }
        assert!(!stored.contains("resume_path"));
    }

    #[test]
    fn test_reads_previously_stored_record() {
        let stored = json!({
            "id": "7f2e",
            "resumePath": "uploads/7f2e/resume.pdf",
            "imagePath": "uploads/7f2e/preview.png",
            "companyName": "Globex",
            "jobTitle": "SRE",
            "jobDescription": "On-call and observability",
            "feedback": {
                "overallScore": 62.5,
                "ATS": {"score": 60, "tips": [{"type": "improve", "tip": "Add keywords"}]},
                "toneAndStyle": {"score": 65, "tips": []},
                "content": {"score": 60, "tips": []},
                "structure": {"score": 70, "tips": []},
                "skills": {"score": 55, "tips": []},
            },
            "createdAt": "2025-02-10T08:30:00.000Z",
        })
        .to_string();
        let record: ResumeRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(record.company_name, "Globex");
        assert_eq!(record.feedback.overall_score.to_string(), "62.5");
        assert!(record.created_at.is_some());
    }

    #[test]
    #[traced_test]
    fn test_listing_sorts_newest_first_and_skips_corrupt_rows() {
        let older = sample_resume("old", Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        let newer = sample_resume("new", Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()));
        let undated = sample_resume("undated", None);
        let items = vec![
            KvItem {
                key: "resume:old".into(),
                value: older.to_json().unwrap(),
            },
            KvItem {
                key: "resume:broken".into(),
                value: "{not json".into(),
            },
            KvItem {
                key: "resume:undated".into(),
                value: undated.to_json().unwrap(),
            },
            KvItem {
                key: "resume:new".into(),
                value: newer.to_json().unwrap(),
            },
        ];
        let listed = parse_resume_listing(items);
        let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
        assert!(logs_contain("skipping undecodable record at resume:broken"));
    }

    #[test]
    fn test_class_record_defaults_students_to_empty() {
        let stored = json!({
            "id": "c1",
            "name": "Spring Cohort",
            "description": "Weekly resume reviews",
            "createdAt": "2025-02-10T08:30:00Z",
        })
        .to_string();
        let record: ClassRecord = serde_json::from_str(&stored).unwrap();
        assert!(record.students.is_empty());

        let out = record.to_json().unwrap();
        assert!(out.contains("\"students\":[]"));
    }
}
