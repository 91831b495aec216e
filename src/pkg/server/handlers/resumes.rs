use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path as AxumPath, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect},
    Extension,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    conf::settings,
    pkg::{
        internal::{
            ai::{feedback, generate::GenerateOps, read::extract_document},
            auth::User,
            kv::KvStore,
            minio::S3Ops,
            records::{self, ResumeRecord},
        },
        server::state::{AppState, GetTxn},
    },
    prelude::{Error, Result},
};

const MAX_RESUME_BYTES: usize = 20 * 1024 * 1024;

/// Full review pipeline for one uploaded resume: store the PDF, render a
/// preview image, run the model against the job description, validate its
/// reply and persist the record. Steps run in order and the first failure
/// ends the request.
pub async fn analyze(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    mut multipart: Multipart,
) -> Result<HeaderMap> {
    let mut company_name = String::new();
    let mut job_title = String::new();
    let mut job_description = String::new();
    let mut resume_file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "company-name" => company_name = field.text().await?,
            "job-title" => job_title = field.text().await?,
            "job-description" => job_description = field.text().await?,
            "resume" => {
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let data = field.bytes().await?;
                let file_extension = Path::new(&file_name)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("")
                    .to_lowercase();
                if file_extension != "pdf" {
                    return Err(Error::Validation(
                        "Invalid file type. Only PDF files are allowed".into(),
                    ));
                }
                if data.len() > MAX_RESUME_BYTES {
                    return Err(Error::Validation(
                        "File too large. Maximum size is 20MB".into(),
                    ));
                }
                if !data.is_empty() {
                    resume_file = Some((file_name, data.to_vec()));
                }
            }
            _ => {
                let _ = field.bytes().await?;
            }
        }
    }

    let Some((file_name, data)) = resume_file else {
        return Err(Error::Validation("Please select a file first".into()));
    };
    if company_name.trim().is_empty()
        || job_title.trim().is_empty()
        || job_description.trim().is_empty()
    {
        return Err(Error::Validation("Please fill in all fields".into()));
    }
    tracing::info!(
        "analyzing {} for {} at {}, submitted by {}",
        &file_name,
        &job_title,
        &company_name,
        &user.name
    );

    let id = Uuid::new_v4().to_string();
    let (resume_path, _) = artifact_keys(&id);

    tracing::info!("uploading the file");
    state
        .s3_client
        .upload_object(
            &settings.s3_bucket_name,
            &resume_path,
            data.clone(),
            "application/pdf",
        )
        .await
        .map_err(|_| Error::Storage("Failed to upload file".into()))?;

    let analysis = analyze_stored(
        &state,
        &id,
        &data,
        company_name,
        job_title,
        job_description,
    )
    .await;
    if let Err(e) = analysis {
        discard_artifacts(&state, &id).await;
        return Err(e);
    }
    tracing::info!("analysis complete, resume {}", &id);

    let mut headers = HeaderMap::new();
    headers.insert(
        "HX-Redirect",
        HeaderValue::from_str(&format!("/resume/{id}"))?,
    );
    Ok(headers)
}

fn artifact_keys(id: &str) -> (String, String) {
    (
        format!("uploads/{id}/resume.pdf"),
        format!("uploads/{id}/preview.png"),
    )
}

/// Everything after the PDF is stored: preview render and upload, model
/// call, validation, record persistence.
async fn analyze_stored(
    state: &AppState,
    id: &str,
    data: &[u8],
    company_name: String,
    job_title: String,
    job_description: String,
) -> Result<()> {
    let (resume_path, image_path) = artifact_keys(id);

    tracing::info!("converting to image");
    let preview = state.pdf_renderer.render_first_page(data).await?;

    tracing::info!("uploading the image");
    state
        .s3_client
        .upload_object(&settings.s3_bucket_name, &image_path, preview, "image/png")
        .await
        .map_err(|_| Error::Storage("Failed to upload image".into()))?;

    tracing::info!("analyzing resume, this may take 30-60 seconds");
    let resume_text = extract_document(data)?;
    let instructions = feedback::prepare_instructions(&job_title, &job_description, &resume_text);
    let reply = state.ai_client.direct_query(&instructions).await?;
    let feedback = feedback::parse_feedback(&reply)?;

    let record = ResumeRecord {
        id: id.to_string(),
        resume_path,
        image_path,
        company_name,
        job_title,
        job_description,
        feedback,
        created_at: Some(Utc::now()),
    };

    tracing::info!("saving analysis");
    let mut tx = state.db_pool.begin_txn().await?;
    KvStore::new(&mut *tx)
        .set(&records::resume_key(id), &record.to_json()?)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// Removes the stored PDF and preview after a failed analysis so the
/// bucket does not accumulate objects no record points at. Failures are
/// logged and swallowed; the caller is already returning an error.
async fn discard_artifacts(state: &AppState, id: &str) {
    let (resume_path, image_path) = artifact_keys(id);
    for key in [resume_path, image_path] {
        if let Err(e) = state
            .s3_client
            .remove_object(&settings.s3_bucket_name, &key)
            .await
        {
            tracing::warn!("failed to clean up {key}: {e}");
        }
    }
}

async fn load_record(state: &AppState, id: &str) -> Result<ResumeRecord> {
    let mut tx = state.db_pool.begin_txn().await?;
    let stored = KvStore::new(&mut *tx)
        .get(&records::resume_key(id))
        .await?
        .ok_or_else(|| Error::NotFound("Resume not found".into()))?;
    Ok(serde_json::from_str(&stored)?)
}

pub async fn retrieve_file(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<impl IntoResponse> {
    let record = load_record(&state, &id).await?;
    let (data, content_type) = state
        .s3_client
        .retrieve_object(&settings.s3_bucket_name, &record.resume_path)
        .await?;
    Ok(([(CONTENT_TYPE, content_type)], data))
}

pub async fn retrieve_image(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<impl IntoResponse> {
    let record = load_record(&state, &id).await?;
    let (data, content_type) = state
        .s3_client
        .retrieve_object(&settings.s3_bucket_name, &record.image_path)
        .await?;
    Ok(([(CONTENT_TYPE, content_type)], data))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    AxumPath(id): AxumPath<String>,
) -> Result<Redirect> {
    let record = load_record(&state, &id).await?;
    state
        .s3_client
        .remove_object(&settings.s3_bucket_name, &record.resume_path)
        .await?;
    state
        .s3_client
        .remove_object(&settings.s3_bucket_name, &record.image_path)
        .await?;
    let mut tx = state.db_pool.begin_txn().await?;
    KvStore::new(&mut *tx)
        .delete(&records::resume_key(&id))
        .await?;
    tx.commit().await?;
    tracing::info!("resume {} deleted by {}", &id, &user.name);
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // The cleanup path recomputes the object keys from the id alone, so
    // they must match what the upload stages wrote.
    #[test]
    fn test_artifact_keys_follow_the_upload_scheme() {
        let (pdf, png) = artifact_keys("7f2e");
        assert_eq!(pdf, "uploads/7f2e/resume.pdf");
        assert_eq!(png, "uploads/7f2e/preview.png");
    }
}
