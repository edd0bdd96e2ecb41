use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use std::sync::Arc;

use crate::db::services::catalog_service;
use crate::web::models::{IngredientResponse, IngredientSearchParams, TagResponse};
use crate::web::{AppError, AppState};

async fn list_tags_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = catalog_service::list_tags(&app_state.db_pool).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

async fn get_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<Json<TagResponse>, AppError> {
    let tag = catalog_service::get_tag(&app_state.db_pool, tag_id).await?;
    Ok(Json(tag.into()))
}

async fn list_ingredients_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<IngredientSearchParams>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let ingredients = catalog_service::list_ingredients(&app_state.db_pool, params.search.as_deref()).await?;
    Ok(Json(ingredients.into_iter().map(IngredientResponse::from).collect()))
}

async fn get_ingredient_handler(
    State(app_state): State<Arc<AppState>>,
    Path(ingredient_id): Path<i32>,
) -> Result<Json<IngredientResponse>, AppError> {
    let ingredient = catalog_service::get_ingredient(&app_state.db_pool, ingredient_id).await?;
    Ok(Json(ingredient.into()))
}

// --- Router ---

/// Tags and ingredients are read-only over HTTP; they are loaded from the CLI.
pub fn create_catalog_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tags/", get(list_tags_handler))
        .route("/api/tags/{tag_id}/", get(get_tag_handler))
        .route("/api/ingridients/", get(list_ingredients_handler))
        .route("/api/ingridients/{ingredient_id}/", get(get_ingredient_handler))
}
