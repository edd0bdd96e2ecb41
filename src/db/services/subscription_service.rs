use std::collections::HashSet;

use sea_orm::sea_query::Query;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::info;

use crate::db::entities::{recipe, subscription, user};
use crate::db::services::{fetch_page, get_user_by_id};
use crate::web::error::AppError;
use crate::web::models::{
    PageRequest, Paginated, ShortRecipeResponse, SubscriptionResponse, UserResponse,
};

// --- Subscription Service Functions ---

/// Subscribes `user_id` to `author_id`.
///
/// Self-subscription and a second subscription to the same author are both
/// conflicts. The composite primary key backs the duplicate check, so a
/// concurrent duplicate insert is rejected by the store as well.
pub async fn subscribe(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<user::Model, AppError> {
    let author = get_user_by_id(db, author_id).await?;
    if user_id == author_id {
        return Err(AppError::Conflict(
            "You cannot subscribe to yourself.".to_string(),
        ));
    }

    let already = subscription::Entity::find_by_id((user_id, author_id))
        .one(db)
        .await?
        .is_some();
    if already {
        return Err(AppError::Conflict(
            "You are already subscribed to this user.".to_string(),
        ));
    }

    subscription::Entity::insert(subscription::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
    })
    .exec_without_returning(db)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "You are already subscribed to this user."))?;

    info!(user_id, author_id, "Subscription created.");
    Ok(author)
}

/// Removes the subscription if it exists. Returns the number of rows removed.
pub async fn unsubscribe(db: &DatabaseConnection, user_id: i32, author_id: i32) -> Result<u64, DbErr> {
    let result = subscription::Entity::delete_many()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// The subset of `author_ids` that `viewer` is subscribed to.
pub async fn subscribed_author_ids(
    db: &DatabaseConnection,
    viewer: Option<i32>,
    author_ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    let Some(viewer_id) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let rows = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(viewer_id))
        .filter(subscription::Column::AuthorId.is_in(author_ids.to_vec()))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| row.author_id).collect())
}

pub async fn count_subscribers(db: &DatabaseConnection, author_id: i32) -> Result<u64, DbErr> {
    subscription::Entity::find()
        .filter(subscription::Column::AuthorId.eq(author_id))
        .count(db)
        .await
}

/// Builds the subscription view of `author`: profile, newest recipes
/// (optionally truncated to `recipes_limit`) and total recipe count.
pub async fn build_subscription_response(
    db: &DatabaseConnection,
    author: user::Model,
    is_subscribed: bool,
    recipes_limit: Option<u32>,
    media_url: &str,
) -> Result<SubscriptionResponse, DbErr> {
    let base = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author.id))
        .order_by_desc(recipe::Column::Id);

    let recipes_count = base.clone().count(db).await?;
    let recipes = match recipes_limit {
        Some(limit) => base.limit(u64::from(limit)).all(db).await?,
        None => base.all(db).await?,
    };

    Ok(SubscriptionResponse {
        user: UserResponse::from_model(author, is_subscribed),
        recipes: recipes
            .into_iter()
            .map(|r| ShortRecipeResponse::from_model(r, media_url))
            .collect(),
        recipes_count,
    })
}

/// Authors `user_id` follows, ordered by author id.
pub async fn list_subscriptions(
    db: &DatabaseConnection,
    user_id: i32,
    page: PageRequest,
    recipes_limit: Option<u32>,
    media_url: &str,
) -> Result<Paginated<SubscriptionResponse>, AppError> {
    let followed = Query::select()
        .column(subscription::Column::AuthorId)
        .from(subscription::Entity)
        .and_where(subscription::Column::UserId.eq(user_id))
        .to_owned();

    let select = user::Entity::find()
        .filter(user::Column::Id.in_subquery(followed))
        .order_by_asc(user::Column::Id);
    let (authors, count) = fetch_page(db, select, page).await?;

    let mut results = Vec::with_capacity(authors.len());
    for author in authors {
        results.push(build_subscription_response(db, author, true, recipes_limit, media_url).await?);
    }
    Ok(Paginated::new(results, count, page))
}
