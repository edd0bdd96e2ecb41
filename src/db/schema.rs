//! Creates the tables from the entity definitions.
//!
//! Every statement is `IF NOT EXISTS`, so this is safe to run on each start.
//! It never alters existing tables.

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::info;

use crate::db::entities::prelude::*;
use crate::db::entities::recipe_ingredient;

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // Parents before children so foreign keys resolve.
    create_table(db, &schema, User).await?;
    create_table(db, &schema, Tag).await?;
    create_table(db, &schema, Ingredient).await?;
    create_table(db, &schema, Recipe).await?;
    create_table(db, &schema, RecipeIngredient).await?;
    create_table(db, &schema, RecipeTag).await?;
    create_table(db, &schema, Subscription).await?;
    create_table(db, &schema, FavoriteRecipe).await?;
    create_table(db, &schema, ShoppingCart).await?;

    let recipe_ingredient_unique = Index::create()
        .name("idx_recipe_ingredients_recipe_ingredient")
        .table(RecipeIngredient)
        .col(recipe_ingredient::Column::RecipeId)
        .col(recipe_ingredient::Column::IngredientId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&recipe_ingredient_unique)).await?;

    info!("Database schema is ready.");
    Ok(())
}
