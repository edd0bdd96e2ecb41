use axum::{
    body::Body as AxumBody,
    extract::{FromRequestParts, State},
    http::{Request, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::services::auth_service;
use crate::web::models::AuthenticatedUser;
use crate::web::{AppState, error::AppError};

pub const TOKEN_COOKIE: &str = "token";

/// Strips the `Token ` or `Bearer ` scheme from an Authorization header value.
fn token_from_header(value: &str) -> Option<&str> {
    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the caller for every request.
///
/// Always inserts an `Option<AuthenticatedUser>` extension; a present but
/// invalid token is rejected with 401 instead of being treated as anonymous.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    // Authorization header first, then the cookie set at login.
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(token_from_header)
        .map(|s| s.to_string())
        .or_else(|| jar.get(TOKEN_COOKIE).map(|c| c.value().to_string()));

    let authenticated_user = match token {
        Some(token) => Some(auth_service::decode_token(&token, &state.config.jwt_secret)?),
        None => None,
    };

    if let Some(user) = &authenticated_user {
        req.extensions_mut().insert(user.clone());
    }
    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}

/// Handlers that need a logged-in caller take `AuthenticatedUser` directly.
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided.".to_string())
            })
    }
}
