use std::sync::Arc;

use crate::pkg::internal::ai::client::AiClient;
use crate::prelude::Result;

#[async_trait::async_trait]
pub trait GenerateOps {
    async fn direct_query(&self, query: &str) -> Result<String>;
}

#[async_trait::async_trait]
impl GenerateOps for Arc<AiClient> {
    async fn direct_query(&self, query: &str) -> Result<String> {
        tracing::debug!("sending chat completion request ({} chars)", query.len());
        let answer = self.chat(query).await?;
        tracing::debug!("received completion ({} chars)", answer.len());
        Ok(answer)
    }
}
