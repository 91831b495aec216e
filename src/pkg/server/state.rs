use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, PgPool, Pool, Postgres, Transaction};

use crate::{
    conf::settings,
    pkg::internal::{ai::client::AiClient, minio, minio::S3Ops, pdfimg::PdfImageRenderer},
    prelude::Result,
};

pub fn db_pool() -> Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database_pool_max_connections)
        .connect_lazy(&settings.database_url)?;
    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub db_pool: Arc<PgPool>,
    pub s3_client: Arc<aws_sdk_s3::Client>,
    pub ai_client: Arc<AiClient>,
    pub pdf_renderer: Arc<PdfImageRenderer>,
}

impl AppState {
    pub async fn new() -> Result<AppState> {
        let s3_client = minio::build_client().await;
        s3_client.ensure_bucket(&settings.s3_bucket_name).await?;
        tracing::debug!("object storage ready, bucket {}", &settings.s3_bucket_name);
        Ok(AppState {
            db_pool: Arc::new(db_pool()?),
            s3_client: Arc::new(s3_client),
            ai_client: Arc::new(AiClient::from_settings()?),
            pdf_renderer: Arc::new(PdfImageRenderer::from_settings()),
        })
    }
}

#[async_trait::async_trait]
pub trait GetTxn {
    async fn begin_txn(&self) -> Result<Transaction<'static, Postgres>>;
}

#[async_trait::async_trait]
impl GetTxn for Arc<PgPool> {
    async fn begin_txn(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.begin().await?)
    }
}
