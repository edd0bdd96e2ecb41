use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::info;

use crate::db::services::{
    self, NewRecipe, RecipeChanges, RecipeCollection, RecipeFilter,
};
use crate::services::image_service;
use crate::web::models::{
    AuthenticatedUser, CreateRecipeRequest, PageRequest, Paginated, RecipeListParams,
    RecipeResponse, ShortRecipeResponse, UpdateRecipeRequest, parse_flag, parse_positive,
};
use crate::web::{AppError, AppState};

// --- Route Handlers ---

async fn list_recipes_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(viewer): Extension<Option<AuthenticatedUser>>,
    Query(params): Query<RecipeListParams>,
) -> Result<Json<Paginated<RecipeResponse>>, AppError> {
    let page = PageRequest::parse(params.page.as_deref(), params.limit.as_deref())?;
    let author_id = params
        .author
        .as_deref()
        .map(|raw| {
            parse_positive("author", raw).and_then(|id| {
                i32::try_from(id).map_err(|_| AppError::InvalidInput(format!("Unknown author '{raw}'.")))
            })
        })
        .transpose()?;
    let filter = RecipeFilter {
        author_id,
        tag_slugs: params.tags,
        is_favorited: params
            .is_favorited
            .as_deref()
            .map(|raw| parse_flag("is_favorited", raw))
            .transpose()?,
        is_in_shopping_cart: params
            .is_in_shopping_cart
            .as_deref()
            .map(|raw| parse_flag("is_in_shopping_cart", raw))
            .transpose()?,
    };

    let recipes = services::list_recipes(
        &app_state.db_pool,
        viewer.map(|u| u.id),
        &filter,
        page,
        &app_state.config.media_url,
    )
    .await?;
    Ok(Json(recipes))
}

async fn get_recipe_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(viewer): Extension<Option<AuthenticatedUser>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = services::get_recipe_response(
        &app_state.db_pool,
        recipe_id,
        viewer.map(|u| u.id),
        &app_state.config.media_url,
    )
    .await?;
    Ok(Json(recipe))
}

async fn create_recipe_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), AppError> {
    let image = match payload.image.as_deref() {
        Some(data_url) => Some(image_service::save_base64_image(&app_state.config.media_dir, data_url).await?),
        None => None,
    };

    let created = services::create_recipe(
        &app_state.db_pool,
        auth_user.id,
        NewRecipe {
            name: payload.name,
            text: payload.text,
            image: image.clone(),
            cooking_time: payload.cooking_time,
            tag_ids: payload.tags,
            ingredients: payload.ingredients,
        },
    )
    .await;

    let recipe = match created {
        Ok(recipe) => recipe,
        Err(e) => {
            if let Some(path) = image {
                image_service::remove_image(&app_state.config.media_dir, &path).await;
            }
            return Err(e);
        }
    };

    let response = services::build_recipe_response(
        &app_state.db_pool,
        recipe,
        Some(auth_user.id),
        &app_state.config.media_url,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_recipe_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    // Ownership is checked before anything is written to the media directory.
    let existing = services::get_recipe_by_id(&app_state.db_pool, recipe_id).await?;
    if existing.author_id != auth_user.id {
        return Err(AppError::Forbidden(
            "Only the author can modify this recipe.".to_string(),
        ));
    }

    let image = match payload.image.as_deref() {
        Some(data_url) => Some(image_service::save_base64_image(&app_state.config.media_dir, data_url).await?),
        None => None,
    };

    let updated = services::update_recipe(
        &app_state.db_pool,
        recipe_id,
        auth_user.id,
        RecipeChanges {
            name: payload.name,
            text: payload.text,
            image: image.clone(),
            cooking_time: payload.cooking_time,
            tag_ids: payload.tags,
            ingredients: payload.ingredients,
        },
    )
    .await;

    let (recipe, replaced_image) = match updated {
        Ok(result) => result,
        Err(e) => {
            if let Some(path) = image {
                image_service::remove_image(&app_state.config.media_dir, &path).await;
            }
            return Err(e);
        }
    };
    if let Some(old) = replaced_image {
        image_service::remove_image(&app_state.config.media_dir, &old).await;
    }

    let response = services::build_recipe_response(
        &app_state.db_pool,
        recipe,
        Some(auth_user.id),
        &app_state.config.media_url,
    )
    .await?;
    Ok(Json(response))
}

async fn delete_recipe_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let image = services::delete_recipe(&app_state.db_pool, recipe_id, auth_user.id).await?;
    if let Some(path) = image {
        image_service::remove_image(&app_state.config.media_dir, &path).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_collection(
    app_state: &AppState,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(StatusCode, Json<ShortRecipeResponse>), AppError> {
    let recipe = services::add_to_collection(&app_state.db_pool, collection, user_id, recipe_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ShortRecipeResponse::from_model(recipe, &app_state.config.media_url)),
    ))
}

async fn remove_from_collection(
    app_state: &AppState,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> Result<StatusCode, AppError> {
    let removed = services::remove_from_collection(&app_state.db_pool, collection, user_id, recipe_id).await?;
    if removed > 0 {
        info!(user_id, recipe_id, collection = collection.label(), "Recipe removed from collection.");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn add_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<ShortRecipeResponse>), AppError> {
    add_to_collection(&app_state, RecipeCollection::Favorites, auth_user.id, recipe_id).await
}

async fn remove_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    remove_from_collection(&app_state, RecipeCollection::Favorites, auth_user.id, recipe_id).await
}

async fn add_to_cart_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<ShortRecipeResponse>), AppError> {
    add_to_collection(&app_state, RecipeCollection::ShoppingCart, auth_user.id, recipe_id).await
}

async fn remove_from_cart_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    remove_from_collection(&app_state, RecipeCollection::ShoppingCart, auth_user.id, recipe_id).await
}

async fn download_shopping_cart_handler(
    State(app_state): State<Arc<AppState>>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let lines = services::shopping_list(&app_state.db_pool, auth_user.id).await?;
    let report = services::render_shopping_list(&lines);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.txt\"",
            ),
        ],
        report,
    ))
}

// --- Router ---

pub fn create_recipe_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/recipes/",
            get(list_recipes_handler).post(create_recipe_handler),
        )
        .route(
            "/api/recipes/download_shopping_cart/",
            get(download_shopping_cart_handler),
        )
        .route(
            "/api/recipes/{recipe_id}/",
            get(get_recipe_handler)
                .patch(update_recipe_handler)
                .delete(delete_recipe_handler),
        )
        .route(
            "/api/recipes/{recipe_id}/favorite/",
            post(add_favorite_handler).delete(remove_favorite_handler),
        )
        .route(
            "/api/recipes/{recipe_id}/shopping_cart/",
            post(add_to_cart_handler).delete(remove_from_cart_handler),
        )
}
