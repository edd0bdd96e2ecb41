//! Per-user recipe collections: favorites and the shopping cart.
//!
//! Both are `(user, recipe)` membership sets keyed by a composite primary key,
//! so they share one implementation parameterised by [`RecipeCollection`].

use std::collections::HashSet;

use sea_orm::sea_query::Query;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use tracing::info;

use crate::db::entities::{favorite_recipe, recipe, shopping_cart};
use crate::db::services::get_recipe_by_id;
use crate::web::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeCollection {
    Favorites,
    ShoppingCart,
}

impl RecipeCollection {
    pub fn label(self) -> &'static str {
        match self {
            RecipeCollection::Favorites => "favorites",
            RecipeCollection::ShoppingCart => "shopping cart",
        }
    }

    fn duplicate_message(self) -> String {
        format!("This recipe is already in your {}.", self.label())
    }

    /// `SELECT recipe_id FROM <collection> WHERE user_id = ?`
    pub fn recipe_ids_of(self, user_id: i32) -> sea_orm::sea_query::SelectStatement {
        match self {
            RecipeCollection::Favorites => Query::select()
                .column(favorite_recipe::Column::RecipeId)
                .from(favorite_recipe::Entity)
                .and_where(favorite_recipe::Column::UserId.eq(user_id))
                .to_owned(),
            RecipeCollection::ShoppingCart => Query::select()
                .column(shopping_cart::Column::RecipeId)
                .from(shopping_cart::Entity)
                .and_where(shopping_cart::Column::UserId.eq(user_id))
                .to_owned(),
        }
    }

    async fn contains<C: ConnectionTrait>(self, db: &C, user_id: i32, recipe_id: i32) -> Result<bool, DbErr> {
        let found = match self {
            RecipeCollection::Favorites => favorite_recipe::Entity::find_by_id((user_id, recipe_id))
                .one(db)
                .await?
                .is_some(),
            RecipeCollection::ShoppingCart => shopping_cart::Entity::find_by_id((user_id, recipe_id))
                .one(db)
                .await?
                .is_some(),
        };
        Ok(found)
    }

    async fn insert<C: ConnectionTrait>(self, db: &C, user_id: i32, recipe_id: i32) -> Result<(), DbErr> {
        match self {
            RecipeCollection::Favorites => {
                favorite_recipe::Entity::insert(favorite_recipe::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                })
                .exec_without_returning(db)
                .await?;
            }
            RecipeCollection::ShoppingCart => {
                shopping_cart::Entity::insert(shopping_cart::ActiveModel {
                    user_id: Set(user_id),
                    recipe_id: Set(recipe_id),
                })
                .exec_without_returning(db)
                .await?;
            }
        }
        Ok(())
    }

    async fn delete<C: ConnectionTrait>(self, db: &C, user_id: i32, recipe_id: i32) -> Result<u64, DbErr> {
        let result = match self {
            RecipeCollection::Favorites => {
                favorite_recipe::Entity::delete_many()
                    .filter(favorite_recipe::Column::UserId.eq(user_id))
                    .filter(favorite_recipe::Column::RecipeId.eq(recipe_id))
                    .exec(db)
                    .await?
            }
            RecipeCollection::ShoppingCart => {
                shopping_cart::Entity::delete_many()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .exec(db)
                    .await?
            }
        };
        Ok(result.rows_affected)
    }
}

/// Adds `recipe_id` to the user's collection. The recipe must exist; adding it
/// twice is a conflict and leaves the collection unchanged.
pub async fn add_to_collection(
    db: &DatabaseConnection,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> Result<recipe::Model, AppError> {
    let recipe = get_recipe_by_id(db, recipe_id).await?;

    if collection.contains(db, user_id, recipe_id).await? {
        return Err(AppError::Conflict(collection.duplicate_message()));
    }
    collection
        .insert(db, user_id, recipe_id)
        .await
        .map_err(|e| AppError::from_unique_violation(e, &collection.duplicate_message()))?;

    info!(user_id, recipe_id, collection = collection.label(), "Recipe added to collection.");
    Ok(recipe)
}

/// Removes `recipe_id` from the user's collection. Removing an absent entry is
/// not an error; the returned count is 0 in that case.
pub async fn remove_from_collection(
    db: &DatabaseConnection,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> Result<u64, DbErr> {
    collection.delete(db, user_id, recipe_id).await
}

/// The subset of `recipe_ids` present in `viewer`'s collection.
pub async fn recipes_in_collection(
    db: &DatabaseConnection,
    collection: RecipeCollection,
    viewer: Option<i32>,
    recipe_ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    let Some(viewer_id) = viewer else {
        return Ok(HashSet::new());
    };
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids = match collection {
        RecipeCollection::Favorites => favorite_recipe::Entity::find()
            .filter(favorite_recipe::Column::UserId.eq(viewer_id))
            .filter(favorite_recipe::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.recipe_id)
            .collect(),
        RecipeCollection::ShoppingCart => shopping_cart::Entity::find()
            .filter(shopping_cart::Column::UserId.eq(viewer_id))
            .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .all(db)
            .await?
            .into_iter()
            .map(|row| row.recipe_id)
            .collect(),
    };
    Ok(ids)
}

pub async fn collection_size(
    db: &DatabaseConnection,
    collection: RecipeCollection,
    user_id: i32,
) -> Result<u64, DbErr> {
    match collection {
        RecipeCollection::Favorites => {
            favorite_recipe::Entity::find()
                .filter(favorite_recipe::Column::UserId.eq(user_id))
                .count(db)
                .await
        }
        RecipeCollection::ShoppingCart => {
            shopping_cart::Entity::find()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .count(db)
                .await
        }
    }
}
