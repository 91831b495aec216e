use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path as AxumPath, Query, State},
    response::Html,
    Extension,
};
use serde::Deserialize;

use crate::{
    pkg::{
        internal::{
            ai::feedback::section_views,
            auth::User,
            kv::KvStore,
            records::{self, ClassRecord, ResumeRecord},
        },
        server::{
            state::{AppState, GetTxn},
            uispec::{
                AuthPage, ClassCard, ClassDetailPage, ClassFormPage, ClassesPage, HomePage,
                OtpPage, ResumeCard, ResumeDetailPage, UploadPage,
            },
        },
    },
    prelude::{Error, Result},
};

pub async fn home(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
) -> Result<Html<String>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let items = KvStore::new(&mut *tx)
        .list_entries(&records::resume_pattern())
        .await?;
    let resumes = records::parse_resume_listing(items);
    tracing::debug!("listing {} resumes for {}", resumes.len(), &user.name);
    let template = HomePage {
        username: &user.name,
        resumes: resumes.iter().map(ResumeCard::from_record).collect(),
    };
    Ok(Html(template.render()?))
}

pub async fn upload_page(Extension(user): Extension<Arc<User>>) -> Result<Html<String>> {
    let template = UploadPage {
        username: &user.name,
    };
    Ok(Html(template.render()?))
}

pub async fn resume_detail(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    AxumPath(id): AxumPath<String>,
) -> Result<Html<String>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let stored = KvStore::new(&mut *tx)
        .get(&records::resume_key(&id))
        .await?
        .ok_or_else(|| Error::NotFound("Resume not found".into()))?;
    let record: ResumeRecord = serde_json::from_str(&stored)?;
    let sections = section_views(&record.feedback);
    let template = ResumeDetailPage::build(&user.name, &record, sections);
    Ok(Html(template.render()?))
}

pub async fn classes_page(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
) -> Result<Html<String>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let items = KvStore::new(&mut *tx)
        .list_entries(&records::class_pattern())
        .await?;
    let classes = records::parse_class_listing(items);
    let template = ClassesPage {
        username: &user.name,
        classes: classes.iter().map(ClassCard::from_record).collect(),
    };
    Ok(Html(template.render()?))
}

pub async fn class_form(Extension(user): Extension<Arc<User>>) -> Result<Html<String>> {
    let template = ClassFormPage {
        username: &user.name,
    };
    Ok(Html(template.render()?))
}

pub async fn class_detail(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    AxumPath(id): AxumPath<String>,
) -> Result<Html<String>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let stored = KvStore::new(&mut *tx)
        .get(&records::class_key(&id))
        .await?
        .ok_or_else(|| Error::NotFound("Class not found".into()))?;
    let record: ClassRecord = serde_json::from_str(&stored)?;
    let template = ClassDetailPage {
        username: &user.name,
        class: ClassCard::from_record(&record),
    };
    Ok(Html(template.render()?))
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Keeps redirects inside the application; anything that is not a local
/// path falls back to the home page.
pub fn sanitize_next(next: Option<String>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/".to_string(),
    }
}

pub async fn auth_page(Query(query): Query<NextQuery>) -> Result<Html<String>> {
    let template = AuthPage {
        next: sanitize_next(query.next),
    };
    Ok(Html(template.render()?))
}

pub async fn otp_page(Query(query): Query<NextQuery>) -> Result<Html<String>> {
    let template = OtpPage {
        next: sanitize_next(query.next),
    };
    Ok(Html(template.render()?))
}
