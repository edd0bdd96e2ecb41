//! Read access to tags and ingredients, plus the administrative loaders that
//! populate them.

use std::collections::HashSet;
use std::io::Read;

use sea_orm::sea_query::{Alias, Expr, Func};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::entities::{ingredient, tag};
use crate::web::error::AppError;

/// Tags created by `load-tags`: (name, color, slug).
pub const DEFAULT_TAGS: [(&str, &str, &str); 3] = [
    ("Завтрак", "#EC6E19", "breakfast"),
    ("Обед", "#DB04E9", "dinner"),
    ("Ужин", "#364236", "evening_meal"),
];

const INSERT_CHUNK: usize = 500;

#[derive(Error, Debug)]
pub enum CatalogLoadError {
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row}: {message}")]
    InvalidRow { row: usize, message: String },
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, Deserialize)]
struct IngredientRow {
    name: String,
    measurement_unit: String,
}

pub async fn list_tags(db: &DatabaseConnection) -> Result<Vec<tag::Model>, DbErr> {
    tag::Entity::find().order_by_asc(tag::Column::Id).all(db).await
}

pub async fn get_tag(db: &DatabaseConnection, tag_id: i32) -> Result<tag::Model, AppError> {
    tag::Entity::find_by_id(tag_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tag {tag_id} not found.")))
}

/// Ingredients whose name starts with `search` (all of them when `None`),
/// ordered by id. The match is exact and case-sensitive; `%` and `_` are
/// plain characters.
pub async fn list_ingredients(
    db: &DatabaseConnection,
    search: Option<&str>,
) -> Result<Vec<ingredient::Model>, DbErr> {
    let mut select = ingredient::Entity::find();
    if let Some(prefix) = search.map(str::trim).filter(|p| !p.is_empty()) {
        // substr counts characters on both SQLite and Postgres.
        let head = Func::cust(Alias::new("substr"))
            .arg(Expr::col((ingredient::Entity, ingredient::Column::Name)))
            .arg(Expr::val(1))
            .arg(Expr::val(prefix.chars().count() as i64));
        select = select.filter(Expr::expr(head).eq(prefix));
    }
    select.order_by_asc(ingredient::Column::Id).all(db).await
}

pub async fn get_ingredient(db: &DatabaseConnection, ingredient_id: i32) -> Result<ingredient::Model, AppError> {
    ingredient::Entity::find_by_id(ingredient_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ingredient {ingredient_id} not found.")))
}

/// Bulk-inserts ingredients from a headered `name,measurement_unit` CSV.
/// The whole file is validated before anything is written. Returns the number
/// of rows inserted.
pub async fn insert_ingredients<R: Read>(
    db: &DatabaseConnection,
    reader: R,
) -> Result<usize, CatalogLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<IngredientRow>().enumerate() {
        let row = record?;
        // Header is line 1.
        let line = index + 2;
        if row.name.is_empty() || row.measurement_unit.is_empty() {
            return Err(CatalogLoadError::InvalidRow {
                row: line,
                message: "name and measurement_unit must not be empty".to_string(),
            });
        }
        rows.push(ingredient::ActiveModel {
            name: Set(row.name),
            measurement_unit: Set(row.measurement_unit),
            ..Default::default()
        });
    }

    let total = rows.len();
    if total == 0 {
        warn!("Ingredient file contained no rows.");
        return Ok(0);
    }

    let txn = db.begin().await?;
    let mut pending = rows.into_iter().peekable();
    while pending.peek().is_some() {
        let chunk: Vec<_> = pending.by_ref().take(INSERT_CHUNK).collect();
        ingredient::Entity::insert_many(chunk)
            .exec_without_returning(&txn)
            .await?;
    }
    txn.commit().await?;

    info!(count = total, "Ingredients loaded.");
    Ok(total)
}

/// Inserts [`DEFAULT_TAGS`], skipping slugs that already exist. Returns the
/// number of tags created.
pub async fn insert_default_tags(db: &DatabaseConnection) -> Result<usize, DbErr> {
    let slugs: Vec<&str> = DEFAULT_TAGS.iter().map(|(_, _, slug)| *slug).collect();
    let existing: HashSet<String> = tag::Entity::find()
        .filter(tag::Column::Slug.is_in(slugs))
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.slug)
        .collect();

    let new_tags: Vec<tag::ActiveModel> = DEFAULT_TAGS
        .iter()
        .filter(|(_, _, slug)| !existing.contains(*slug))
        .map(|(name, color, slug)| tag::ActiveModel {
            name: Set(name.to_string()),
            color: Set(color.to_string()),
            slug: Set(slug.to_string()),
            ..Default::default()
        })
        .collect();

    let created = new_tags.len();
    if created > 0 {
        tag::Entity::insert_many(new_tags).exec_without_returning(db).await?;
    }
    info!(created, skipped = existing.len(), "Default tags loaded.");
    Ok(created)
}
