use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use tracing::info;

use crate::services::auth_service;
use crate::web::middleware::auth::TOKEN_COOKIE;
use crate::web::models::{AuthenticatedUser, LoginRequest};
use crate::web::{AppError, AppState};

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let login_response =
        auth_service::login_user(&app_state.db_pool, payload, &app_state.config.jwt_secret).await?;

    let auth_cookie = Cookie::build((TOKEN_COOKIE, login_response.auth_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();

    Ok((jar.add(auth_cookie), Json(login_response)))
}

/// Tokens are stateless; logout only clears the browser cookie.
async fn logout_handler(auth_user: AuthenticatedUser, jar: CookieJar) -> impl IntoResponse {
    info!(user_id = auth_user.id, "User logged out.");
    (StatusCode::NO_CONTENT, jar.remove(Cookie::build(TOKEN_COOKIE).path("/")))
}

// --- Router ---

pub fn create_auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/token/login/", post(login_handler))
        .route("/api/auth/token/logout/", post(logout_handler))
}
