use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

use crate::db::services::{self, subscription_service};
use crate::services::auth_service;
use crate::web::models::{
    AuthenticatedUser, ListParams, PageRequest, Paginated, RegisterRequest, SetPasswordRequest,
    SubscriptionParams, SubscriptionResponse, UserResponse, parse_small_positive,
};
use crate::web::{AppError, AppState};

async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = auth_service::register_user(&app_state.db_pool, payload, app_state.config.bcrypt_cost).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(viewer): Extension<Option<AuthenticatedUser>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<UserResponse>>, AppError> {
    let page = PageRequest::parse(params.page.as_deref(), params.limit.as_deref())?;
    let users = services::list_users(&app_state.db_pool, viewer.map(|u| u.id), page).await?;
    Ok(Json(users))
}

async fn get_user_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(viewer): Extension<Option<AuthenticatedUser>>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::get_user_response(&app_state.db_pool, user_id, viewer.map(|u| u.id)).await?;
    Ok(Json(user))
}

async fn me_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::get_user_response(&app_state.db_pool, auth_user.id, Some(auth_user.id)).await?;
    Ok(Json(user))
}

async fn set_password_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    auth_service::set_password(
        &app_state.db_pool,
        auth_user.id,
        payload,
        app_state.config.bcrypt_cost,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_recipes_limit(raw: Option<&str>) -> Result<Option<u32>, AppError> {
    raw.map(|value| parse_small_positive("recipes_limit", value)).transpose()
}

async fn subscribe_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
    Path(author_id): Path<i32>,
    Query(params): Query<SubscriptionParams>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), AppError> {
    let recipes_limit = parse_recipes_limit(params.recipes_limit.as_deref())?;
    let author = subscription_service::subscribe(&app_state.db_pool, auth_user.id, author_id).await?;
    let response = subscription_service::build_subscription_response(
        &app_state.db_pool,
        author,
        true,
        recipes_limit,
        &app_state.config.media_url,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn unsubscribe_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
    Path(author_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    subscription_service::unsubscribe(&app_state.db_pool, auth_user.id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn subscriptions_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
    Query(params): Query<SubscriptionParams>,
) -> Result<Json<Paginated<SubscriptionResponse>>, AppError> {
    let page = PageRequest::parse(params.page.as_deref(), params.limit.as_deref())?;
    let recipes_limit = parse_recipes_limit(params.recipes_limit.as_deref())?;
    let subscriptions = subscription_service::list_subscriptions(
        &app_state.db_pool,
        auth_user.id,
        page,
        recipes_limit,
        &app_state.config.media_url,
    )
    .await?;
    Ok(Json(subscriptions))
}

// --- Router ---

pub fn create_user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/", get(list_users_handler).post(register_handler))
        .route("/api/users/me/", get(me_handler))
        .route("/api/users/set_password/", post(set_password_handler))
        .route("/api/users/subscriptions/", get(subscriptions_handler))
        .route("/api/users/{user_id}/", get(get_user_handler))
        .route(
            "/api/users/{user_id}/subscribe/",
            post(subscribe_handler).delete(unsubscribe_handler),
        )
}
