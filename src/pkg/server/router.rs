use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::{routing::get, Router};

use super::handlers::auth::{logout, signup, verify};
use super::handlers::probes::{healthz, livez};
use super::handlers::{classes, resumes, ui};
use super::middlewares::authn;
use super::state::AppState;
use crate::prelude::Result;

// Multipart ceiling; the per-file cap is enforced in the upload handler.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub async fn build_routes() -> Result<Router> {
    let state = AppState::new().await?;
    let app = Router::new()
        .route("/", get(ui::home))
        .route("/upload", get(ui::upload_page).post(resumes::analyze))
        .route("/resume/:id", get(ui::resume_detail))
        .route("/resume/:id/file", get(resumes::retrieve_file))
        .route("/resume/:id/image", get(resumes::retrieve_image))
        .route("/resume/:id/delete", post(resumes::delete))
        .route("/classes", get(ui::classes_page).post(classes::create))
        .route("/classes/new", get(ui::class_form))
        .route("/classes/:id", get(ui::class_detail))
        .route("/logout", post(logout))
        .layer(from_fn_with_state(state.clone(), authn::authenticate))
        .route("/auth", get(ui::auth_page))
        .route("/otp", get(ui::otp_page))
        .route("/signup", post(signup))
        .route("/verify", post(verify))
        .route("/healthz", get(healthz))
        .route("/livez", get(livez))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    Ok(app)
}
