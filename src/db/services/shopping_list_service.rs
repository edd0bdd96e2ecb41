use std::fmt::Write;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use tracing::debug;

use crate::db::entities::{ingredient, recipe_ingredient};
use crate::db::services::RecipeCollection;

/// One aggregated line of a shopping list.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Sums ingredient amounts over every recipe in the user's cart, one line per
/// ingredient, ordered by ingredient id.
pub async fn shopping_list(db: &DatabaseConnection, user_id: i32) -> Result<Vec<ShoppingListLine>, DbErr> {
    let lines = recipe_ingredient::Entity::find()
        .select_only()
        .column_as(ingredient::Column::Name, "name")
        .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
        .column_as(Expr::col((recipe_ingredient::Entity, recipe_ingredient::Column::Amount)).sum(), "total_amount")
        .join(JoinType::InnerJoin, recipe_ingredient::Relation::Ingredient.def())
        .filter(
            recipe_ingredient::Column::RecipeId
                .in_subquery(RecipeCollection::ShoppingCart.recipe_ids_of(user_id)),
        )
        .group_by(ingredient::Column::Id)
        .group_by(ingredient::Column::Name)
        .group_by(ingredient::Column::MeasurementUnit)
        .order_by_asc(ingredient::Column::Id)
        .into_model::<ShoppingListLine>()
        .all(db)
        .await?;

    debug!(user_id, lines = lines.len(), "Shopping list aggregated.");
    Ok(lines)
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the
/// rest.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

pub fn render_shopping_list(lines: &[ShoppingListLine]) -> String {
    let mut report = String::new();
    for line in lines {
        // Writing to a String cannot fail.
        let _ = writeln!(
            report,
            " *  {} ({}) - {}",
            title_case(&line.name),
            line.measurement_unit,
            line.total_amount
        );
    }
    report
}
