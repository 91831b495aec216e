use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::Html,
    Extension, Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use validator::Validate;

use crate::{
    pkg::{
        internal::auth::{AuthToken, TokenStatus, User},
        server::{
            handlers::ui::sanitize_next,
            middlewares::authn::{EMAIL_COOKIE, TOKEN_COOKIE},
            state::AppState,
        },
    },
    prelude::Result,
};

#[derive(Deserialize, Validate)]
pub struct SignupInput {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Field cannot be empty"))]
    pub name: String,
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyInput {
    pub code: String,
    pub next: Option<String>,
}

pub async fn signup(
    State(state): State<AppState>,
    Form(input): Form<SignupInput>,
) -> Result<HeaderMap> {
    input.validate()?;
    let user = AuthToken::issue_user_token(&state, &input.email, &input.name).await?;
    let next = sanitize_next(input.next);
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&format!("{}={}; Path=/", EMAIL_COOKIE, &user.email))?,
    );
    headers.insert(
        "HX-Redirect",
        HeaderValue::from_str(&format!("/otp?next={next}"))?,
    );
    Ok(headers)
}

//TODO: only flip the latest pending token instead of every pending row
pub async fn verify(
    headers: HeaderMap,
    State(state): State<AppState>,
    Form(input): Form<VerifyInput>,
) -> Result<(HeaderMap, Html<String>)> {
    let jar = CookieJar::from_headers(&headers);
    let mut headers = HeaderMap::new();
    let failed = Html(
        r#"<div id='code-error' class='text-red-500 text-center text-sm mt-2'>Verification failed, please try again</div>"#
            .to_string(),
    );
    let Some(email) = jar.get(EMAIL_COOKIE).filter(|c| !c.value().is_empty()) else {
        return Ok((headers, failed));
    };
    let Some(user) = User::retrieve(&state, email.value()).await? else {
        return Ok((headers, failed));
    };
    let token = AuthToken::latest_pending(&state, &user.user_id).await?;
    tracing::debug!("verifying token: {:?}", &token);
    match token {
        Some(token) if input.code == token.code => {
            AuthToken::update_status(
                &state,
                &user.user_id,
                TokenStatus::Pending,
                TokenStatus::Verified,
            )
            .await?;
            headers.insert(
                SET_COOKIE,
                HeaderValue::from_str(&format!("{}={}; Path=/", TOKEN_COOKIE, &token.token))?,
            );
            headers.insert(
                "HX-Redirect",
                HeaderValue::from_str(&sanitize_next(input.next))?,
            );
            Ok((
                headers,
                Html(
                    "<div class='text-green-600 text-center text-lg'>Verification successful!</div>"
                        .to_string(),
                ),
            ))
        }
        Some(_) => {
            AuthToken::update_status(
                &state,
                &user.user_id,
                TokenStatus::Pending,
                TokenStatus::Rejected,
            )
            .await?;
            Ok((headers, Html(
                r#"<div id='code-error' class='text-red-500 text-center text-sm mt-2'>Invalid code, please try again.</div>"#
                    .to_string(),
            )))
        }
        None => {
            user.issue_token(&state).await?;
            Ok((
                headers,
                Html(
                    "<div class='text-green-600 text-center text-lg'>No active token found, sent new one!</div>"
                        .to_string(),
                ),
            ))
        }
    }
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
) -> Result<HeaderMap> {
    AuthToken::update_status(
        &state,
        &user.user_id,
        TokenStatus::Verified,
        TokenStatus::Expired,
    )
    .await?;
    tracing::info!("User {} logged out successfully", &user.name);
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&format!("{TOKEN_COOKIE}=; Path=/; Max-Age=0"))?,
    );
    headers.insert("HX-Redirect", HeaderValue::from_str("/auth")?);
    Ok(headers)
}
