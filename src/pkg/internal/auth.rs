use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

use crate::{
    pkg::{
        internal::email::{authtoken::AuthnCodeTemplate, SendEmail},
        server::state::AppState,
    },
    prelude::{Error, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "token_status", rename_all = "lowercase")]
pub enum TokenStatus {
    Pending,
    Verified,
    Rejected,
    Expired,
}

const LATEST_PENDING_SQL: &str = r#"
    SELECT token, user_id, code, expiry, status
    FROM tokens
    WHERE user_id = $1 AND status = $2 AND expiry > NOW()
    ORDER BY created_at DESC
    LIMIT 1
    "#;

#[derive(FromRow, Debug)]
pub struct AuthToken {
    pub token: Uuid,
    pub user_id: String,
    pub code: String,
    pub expiry: DateTime<Utc>,
    pub status: TokenStatus,
}

#[derive(FromRow, Debug)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

impl User {
    pub async fn create(state: &AppState, email: &str, name: &str) -> Result<Self> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
            SET name = $2
            RETURNING user_id, email, name
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(Uuid::new_v4().to_string())
        .fetch_one(&*state.db_pool)
        .await?;
        Ok(user)
    }

    pub async fn retrieve(state: &AppState, email: &str) -> Result<Option<Self>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT user_id, email, name FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&*state.db_pool)
        .await?)
    }

    pub async fn issue_token(&self, state: &AppState) -> Result<()> {
        let pool = &*state.db_pool;
        let code = AuthToken::generate_code();
        tracing::debug!("issued code for {}", &self.email);
        sqlx::query(
            r#"
            INSERT INTO tokens (user_id, code, expiry, status)
            VALUES ($1, $2, NOW() + interval '1 hour', $3)
            "#,
        )
        .bind(&self.user_id)
        .bind(&code)
        .bind(TokenStatus::Pending)
        .execute(pool)
        .await?;
        AuthnCodeTemplate {
            name: &self.name,
            code: &code,
        }
        .send(&self.email)
        .await?;
        Ok(())
    }
}

impl AuthToken {
    fn generate_code() -> String {
        let mut rng = rand::rng();
        (0..6).map(|_| rng.random_range(0..10).to_string()).collect()
    }

    pub async fn issue_user_token(state: &AppState, email: &str, name: &str) -> Result<User> {
        let user = User::create(state, email, name).await?;
        user.issue_token(state).await?;
        Ok(user)
    }

    /// Most recently issued pending, unexpired token for a user, if any.
    /// Expired codes must not match here: verifying one would mint a
    /// session token that `check_token_validity` rejects on the next
    /// request. A stale code instead lands in the resend branch.
    pub async fn latest_pending(state: &AppState, user_id: &str) -> Result<Option<AuthToken>> {
        Ok(sqlx::query_as::<_, AuthToken>(LATEST_PENDING_SQL)
        .bind(user_id)
        .bind(TokenStatus::Pending)
        .fetch_optional(&*state.db_pool)
        .await?)
    }

    pub async fn update_status(
        state: &AppState,
        user_id: &str,
        from: TokenStatus,
        to: TokenStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE tokens SET status = $3 WHERE user_id = $1 AND status = $2")
            .bind(user_id)
            .bind(from)
            .bind(to)
            .execute(&*state.db_pool)
            .await?;
        Ok(())
    }

    /// Resolves a session token to its user. Only verified, unexpired
    /// tokens pass; anything else means the request is unauthenticated.
    pub async fn check_token_validity(state: &AppState, token_str: &str) -> Result<User> {
        let pool = &*state.db_pool;
        let token = token_str
            .parse::<Uuid>()
            .map_err(|_| Error::Auth("malformed session token".into()))?;

        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT token, user_id, code, expiry, status
            FROM tokens
            WHERE token = $1 AND status = $2 AND expiry > NOW()
            "#,
        )
        .bind(token)
        .bind(TokenStatus::Verified)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::Auth("session token expired or not verified".into()))?;

        let user =
            sqlx::query_as::<_, User>("SELECT user_id, email, name FROM users WHERE user_id = $1")
                .bind(&token.user_id)
                .fetch_one(pool)
                .await?;
        Ok(user)
    }
}
