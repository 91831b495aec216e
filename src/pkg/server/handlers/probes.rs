use axum::extract::State;
use sqlx::query;

use crate::{pkg::server::state::AppState, prelude::Result};

pub async fn livez() -> Result<&'static str> {
    tracing::debug!("liveness probe ok");
    Ok("ok")
}

/// Readiness means the database answers; object storage and the model
/// endpoint are checked lazily on first use.
pub async fn healthz(State(state): State<AppState>) -> Result<&'static str> {
    query("SELECT 1").execute(&*state.db_pool).await?;
    tracing::debug!("readiness probe ok");
    Ok("ok")
}
