use askama::Template;
use chrono::{DateTime, Utc};

use crate::pkg::internal::{
    ai::feedback::{score_badge, SectionView},
    records::{ClassRecord, ResumeRecord},
};

fn date_label(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Summary card for one resume on the tracking page.
pub struct ResumeCard {
    pub id: String,
    pub company_name: String,
    pub job_title: String,
    pub overall_score: String,
    pub badge_class: &'static str,
    pub badge_label: &'static str,
    pub uploaded: String,
}

impl ResumeCard {
    pub fn from_record(record: &ResumeRecord) -> Self {
        let (badge_class, badge_label) = score_badge(&record.feedback.overall_score);
        ResumeCard {
            id: record.id.clone(),
            company_name: record.company_name.clone(),
            job_title: record.job_title.clone(),
            overall_score: record.feedback.overall_score.to_string(),
            badge_class,
            badge_label,
            uploaded: date_label(record.created_at),
        }
    }
}

pub struct ClassCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created: String,
    pub student_count: usize,
}

impl ClassCard {
    pub fn from_record(record: &ClassRecord) -> Self {
        ClassCard {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            created: date_label(record.created_at),
            student_count: record.students.len(),
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage<'a> {
    pub username: &'a str,
    pub resumes: Vec<ResumeCard>,
}

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadPage<'a> {
    pub username: &'a str,
}

#[derive(Template)]
#[template(path = "resume.html")]
pub struct ResumeDetailPage<'a> {
    pub username: &'a str,
    pub id: String,
    pub company_name: String,
    pub job_title: String,
    pub overall_score: String,
    pub badge_class: &'static str,
    pub badge_label: &'static str,
    pub uploaded: String,
    pub sections: Vec<SectionView>,
}

impl<'a> ResumeDetailPage<'a> {
    pub fn build(username: &'a str, record: &ResumeRecord, sections: Vec<SectionView>) -> Self {
        let (badge_class, badge_label) = score_badge(&record.feedback.overall_score);
        ResumeDetailPage {
            username,
            id: record.id.clone(),
            company_name: record.company_name.clone(),
            job_title: record.job_title.clone(),
            overall_score: record.feedback.overall_score.to_string(),
            badge_class,
            badge_label,
            uploaded: date_label(record.created_at),
            sections,
        }
    }
}

#[derive(Template)]
#[template(path = "classes.html")]
pub struct ClassesPage<'a> {
    pub username: &'a str,
    pub classes: Vec<ClassCard>,
}

#[derive(Template)]
#[template(path = "class_form.html")]
pub struct ClassFormPage<'a> {
    pub username: &'a str,
}

#[derive(Template)]
#[template(path = "class_detail.html")]
pub struct ClassDetailPage<'a> {
    pub username: &'a str,
    pub class: ClassCard,
}

#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthPage {
    pub next: String,
}

#[derive(Template)]
#[template(path = "otp.html")]
pub struct OtpPage {
    pub next: String,
}
