use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};
use std::sync::Arc;
use tracing::warn;

use crate::web::models::{AuthenticatedUser, Claims};
use crate::web::{AppState, error::AppError};

/// Rejects requests without a valid token.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    if req.extensions().get::<AuthenticatedUser>().is_none() {
        let token = bearer_or_cookie(req.headers(), &jar).ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".to_string())
        })?;
        let authenticated_user = decode_token(&token, &state.config.jwt_secret)
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token.".to_string()))?;
        req.extensions_mut().insert(authenticated_user);
    }
    Ok(next.run(req).await)
}

/// Attaches the user when a valid token is present; anonymous requests pass through.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_or_cookie(req.headers(), &jar) {
        if let Some(authenticated_user) = decode_token(&token, &state.config.jwt_secret) {
            req.extensions_mut().insert(authenticated_user);
        }
    }
    next.run(req).await
}

// Authorization header first, then the "token" cookie.
fn bearer_or_cookie(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| jar.get("token").map(|c| c.value().to_string()))
}

fn decode_token(token: &str, jwt_secret: &str) -> Option<AuthenticatedUser> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!(error = ?e, "JWT decoding error during auth middleware.");
    })
    .ok()?;

    Some(AuthenticatedUser {
        id: token_data.claims.user_id,
        email: token_data.claims.sub,
    })
}
