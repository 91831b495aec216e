use std::sync::Arc;

use axum::{extract::State, response::Redirect, Extension, Form};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    pkg::{
        internal::{
            auth::User,
            kv::KvStore,
            records::{self, ClassRecord},
        },
        server::state::{AppState, GetTxn},
    },
    prelude::Result,
};

#[derive(Deserialize, Validate)]
pub struct ClassInput {
    #[serde(rename = "class-name")]
    #[validate(length(min = 1, message = "Field cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Field cannot be empty"))]
    pub description: String,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Form(input): Form<ClassInput>,
) -> Result<Redirect> {
    input.validate()?;
    let id = Uuid::new_v4().to_string();
    let record = ClassRecord {
        id: id.clone(),
        name: input.name,
        description: input.description,
        created_at: Some(Utc::now()),
        students: vec![],
    };
    let mut tx = state.db_pool.begin_txn().await?;
    KvStore::new(&mut *tx)
        .set(&records::class_key(&id), &record.to_json()?)
        .await?;
    tx.commit().await?;
    tracing::info!("class {} created by {}", &record.name, &user.name);
    Ok(Redirect::to(&format!("/classes/{id}")))
}
