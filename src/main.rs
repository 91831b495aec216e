mod cmd;
pub mod conf;
pub mod pkg;
mod prelude;

use crate::prelude::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("resumind=debug,sqlx=warn")),
        )
        .init();

    cmd::run().await?;
    Ok(())
}
