use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    pkg::{internal::auth::AuthToken, server::state::AppState},
    prelude::{Error, Result},
};

pub const TOKEN_COOKIE: &str = "_Host_rmd_token";
pub const EMAIL_COOKIE: &str = "_Host_rmd_email";

/// Gate for every application route. A valid session cookie puts the
/// resolved user into request extensions; anything else bounces the
/// browser to the login page, remembering where it was headed.
pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let jar = CookieJar::from_headers(&headers);
    if let Some(cookie) = jar.get(TOKEN_COOKIE).filter(|c| !c.value().is_empty()) {
        match AuthToken::check_token_validity(&state, cookie.value()).await {
            Ok(user) => {
                request.extensions_mut().insert(Arc::new(user));
                return Ok(next.run(request).await);
            }
            Err(Error::Auth(reason)) => {
                tracing::warn!("authentication denied: {reason}");
            }
            Err(e) => return Err(e),
        }
    } else {
        tracing::warn!("token missing, authentication denied");
    }
    let next_path = request.uri().path();
    Ok(Redirect::to(&format!("/auth?next={next_path}")).into_response())
}
