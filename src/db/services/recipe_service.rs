use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::db::entities::{
    favorite_recipe, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag, user,
};
use crate::db::services::{fetch_page, recipes_in_collection, subscribed_author_ids, RecipeCollection};
use crate::web::error::AppError;
use crate::web::models::{
    media_link, IngredientAmount, PageRequest, Paginated, RecipeIngredientResponse,
    RecipeResponse, TagResponse, UserResponse,
};

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_TEXT_LEN: usize = 250;

// --- Recipe Service Functions ---

pub struct NewRecipe {
    pub name: String,
    pub text: String,
    /// Stored image path, already written to the media directory.
    pub image: Option<String>,
    pub cooking_time: i32,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Partial update; `None` leaves the field untouched. Provided `tag_ids` and
/// `ingredients` replace the previous sets.
#[derive(Default)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub tag_ids: Option<Vec<i32>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

/// Filters for the recipe list. `is_favorited` and `is_in_shopping_cart` need
/// a viewer and are ignored for anonymous requests.
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub author_id: Option<i32>,
    pub tag_slugs: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidInput("Recipe name must not be empty.".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "Recipe name must be at most {MAX_NAME_LEN} characters."
        )));
    }
    Ok(())
}

fn validate_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::InvalidInput("Recipe text must not be empty.".to_string()));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::InvalidInput(format!(
            "Recipe text must be at most {MAX_TEXT_LEN} characters."
        )));
    }
    Ok(())
}

fn validate_cooking_time(cooking_time: i32) -> Result<(), AppError> {
    if cooking_time <= 0 {
        return Err(AppError::InvalidInput(
            "Cooking time must be a positive number of minutes.".to_string(),
        ));
    }
    Ok(())
}

/// Amounts must be positive and each ingredient may appear once.
pub fn validate_ingredients(ingredients: &[IngredientAmount]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for item in ingredients {
        if item.amount <= 0 {
            return Err(AppError::InvalidInput(format!(
                "Amount of ingredient {} must be positive.",
                item.id
            )));
        }
        if !seen.insert(item.id) {
            return Err(AppError::InvalidInput(format!(
                "Ingredient {} is listed more than once.",
                item.id
            )));
        }
    }
    Ok(())
}

async fn ensure_ingredients_exist<C: ConnectionTrait>(
    db: &C,
    ingredients: &[IngredientAmount],
) -> Result<(), AppError> {
    if ingredients.is_empty() {
        return Ok(());
    }
    let ids: Vec<i32> = ingredients.iter().map(|i| i.id).collect();
    let found: HashSet<i32> = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();
    match ids.into_iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(AppError::NotFound(format!("Ingredient {missing} not found."))),
        None => Ok(()),
    }
}

async fn ensure_tags_exist<C: ConnectionTrait>(db: &C, tag_ids: &[i32]) -> Result<(), AppError> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let found: HashSet<i32> = tag::Entity::find()
        .filter(tag::Column::Id.is_in(tag_ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    match tag_ids.iter().find(|id| !found.contains(*id)) {
        Some(missing) => Err(AppError::InvalidInput(format!("Tag {missing} does not exist."))),
        None => Ok(()),
    }
}

/// Replaces the recipe's ingredient rows, keeping request order.
async fn replace_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    ingredients: &[IngredientAmount],
) -> Result<(), AppError> {
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    // One insert per row so ids follow the request order.
    for item in ingredients {
        recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(item.id),
            amount: Set(item.amount),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn replace_tags<C: ConnectionTrait>(db: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<(), AppError> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    let unique: Vec<i32> = {
        let mut seen = HashSet::new();
        tag_ids.iter().copied().filter(|id| seen.insert(*id)).collect()
    };
    if !unique.is_empty() {
        let rows: Vec<recipe_tag::ActiveModel> = unique
            .into_iter()
            .map(|tag_id| recipe_tag::ActiveModel {
                recipe_id: Set(recipe_id),
                tag_id: Set(tag_id),
            })
            .collect();
        recipe_tag::Entity::insert_many(rows)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

/// Creates a recipe with its ingredient rows and tags in one transaction.
pub async fn create_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    new_recipe: NewRecipe,
) -> Result<recipe::Model, AppError> {
    validate_name(&new_recipe.name)?;
    validate_text(&new_recipe.text)?;
    validate_cooking_time(new_recipe.cooking_time)?;
    validate_ingredients(&new_recipe.ingredients)?;

    let recipe = db
        .transaction::<_, recipe::Model, AppError>(|txn| {
            Box::pin(async move {
                ensure_tags_exist(txn, &new_recipe.tag_ids).await?;
                ensure_ingredients_exist(txn, &new_recipe.ingredients).await?;

                let recipe = recipe::ActiveModel {
                    author_id: Set(author_id),
                    name: Set(new_recipe.name),
                    text: Set(new_recipe.text),
                    image: Set(new_recipe.image),
                    cooking_time: Set(new_recipe.cooking_time),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                replace_ingredients(txn, recipe.id, &new_recipe.ingredients).await?;
                replace_tags(txn, recipe.id, &new_recipe.tag_ids).await?;
                Ok(recipe)
            })
        })
        .await?;

    info!(recipe_id = recipe.id, author_id, "Recipe created.");
    Ok(recipe)
}

pub async fn get_recipe_by_id(db: &DatabaseConnection, recipe_id: i32) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {recipe_id} not found.")))
}

/// Loads a recipe that `user_id` is allowed to modify.
async fn get_owned_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
) -> Result<recipe::Model, AppError> {
    let recipe = get_recipe_by_id(db, recipe_id).await?;
    if recipe.author_id != user_id {
        return Err(AppError::Forbidden(
            "Only the author can modify this recipe.".to_string(),
        ));
    }
    Ok(recipe)
}

/// Applies a partial update. Returns the updated recipe and, when the image
/// was replaced, the path of the previous image.
pub async fn update_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
    changes: RecipeChanges,
) -> Result<(recipe::Model, Option<String>), AppError> {
    if let Some(name) = &changes.name {
        validate_name(name)?;
    }
    if let Some(text) = &changes.text {
        validate_text(text)?;
    }
    if let Some(cooking_time) = changes.cooking_time {
        validate_cooking_time(cooking_time)?;
    }
    if let Some(ingredients) = &changes.ingredients {
        validate_ingredients(ingredients)?;
    }

    let existing = get_owned_recipe(db, recipe_id, user_id).await?;
    let replaced_image = match &changes.image {
        Some(new_image) if existing.image.as_deref() != Some(new_image.as_str()) => existing.image.clone(),
        _ => None,
    };

    let updated = db
        .transaction::<_, recipe::Model, AppError>(|txn| {
            Box::pin(async move {
                if let Some(tag_ids) = &changes.tag_ids {
                    ensure_tags_exist(txn, tag_ids).await?;
                }
                if let Some(ingredients) = &changes.ingredients {
                    ensure_ingredients_exist(txn, ingredients).await?;
                }

                let unchanged = existing.clone();
                let mut active = existing.into_active_model();
                if let Some(name) = changes.name {
                    active.name = Set(name);
                }
                if let Some(text) = changes.text {
                    active.text = Set(text);
                }
                if let Some(image) = changes.image {
                    active.image = Set(Some(image));
                }
                if let Some(cooking_time) = changes.cooking_time {
                    active.cooking_time = Set(cooking_time);
                }
                let recipe = if active.is_changed() {
                    active.update(txn).await?
                } else {
                    unchanged
                };

                if let Some(ingredients) = &changes.ingredients {
                    replace_ingredients(txn, recipe.id, ingredients).await?;
                }
                if let Some(tag_ids) = &changes.tag_ids {
                    replace_tags(txn, recipe.id, tag_ids).await?;
                }
                Ok(recipe)
            })
        })
        .await?;

    info!(recipe_id, user_id, "Recipe updated.");
    Ok((updated, replaced_image))
}

/// Deletes a recipe owned by `user_id`. Returns its image path, if any.
pub async fn delete_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
) -> Result<Option<String>, AppError> {
    let recipe = get_owned_recipe(db, recipe_id, user_id).await?;
    let image = recipe.image.clone();

    db.transaction::<_, (), AppError>(|txn| {
        Box::pin(async move {
            recipe_ingredient::Entity::delete_many()
                .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
                .exec(txn)
                .await?;
            recipe_tag::Entity::delete_many()
                .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
                .exec(txn)
                .await?;
            favorite_recipe::Entity::delete_many()
                .filter(favorite_recipe::Column::RecipeId.eq(recipe_id))
                .exec(txn)
                .await?;
            shopping_cart::Entity::delete_many()
                .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                .exec(txn)
                .await?;
            recipe.delete(txn).await?;
            Ok(())
        })
    })
    .await?;

    info!(recipe_id, user_id, "Recipe deleted.");
    Ok(image)
}

fn apply_filter(mut select: Select<recipe::Entity>, filter: &RecipeFilter, viewer: Option<i32>) -> Select<recipe::Entity> {
    if let Some(author_id) = filter.author_id {
        select = select.filter(recipe::Column::AuthorId.eq(author_id));
    }
    if !filter.tag_slugs.is_empty() {
        let tagged = Query::select()
            .column(recipe_tag::Column::RecipeId)
            .from(recipe_tag::Entity)
            .inner_join(
                tag::Entity,
                Expr::col((tag::Entity, tag::Column::Id))
                    .equals((recipe_tag::Entity, recipe_tag::Column::TagId)),
            )
            .and_where(tag::Column::Slug.is_in(filter.tag_slugs.clone()))
            .to_owned();
        select = select.filter(recipe::Column::Id.in_subquery(tagged));
    }
    if let Some(viewer_id) = viewer {
        for (flag, collection) in [
            (filter.is_favorited, RecipeCollection::Favorites),
            (filter.is_in_shopping_cart, RecipeCollection::ShoppingCart),
        ] {
            select = match flag {
                Some(true) => select.filter(recipe::Column::Id.in_subquery(collection.recipe_ids_of(viewer_id))),
                Some(false) => select.filter(recipe::Column::Id.not_in_subquery(collection.recipe_ids_of(viewer_id))),
                None => select,
            };
        }
    }
    select
}

/// Newest-first recipe list, filtered and paginated.
pub async fn list_recipes(
    db: &DatabaseConnection,
    viewer: Option<i32>,
    filter: &RecipeFilter,
    page: PageRequest,
    media_url: &str,
) -> Result<Paginated<RecipeResponse>, AppError> {
    let select = apply_filter(recipe::Entity::find(), filter, viewer).order_by_desc(recipe::Column::Id);
    let (recipes, count) = fetch_page(db, select, page).await?;
    debug!(count, returned = recipes.len(), "Listed recipes.");

    let results = build_recipe_responses(db, recipes, viewer, media_url).await?;
    Ok(Paginated::new(results, count, page))
}

pub async fn get_recipe_response(
    db: &DatabaseConnection,
    recipe_id: i32,
    viewer: Option<i32>,
    media_url: &str,
) -> Result<RecipeResponse, AppError> {
    let recipe = get_recipe_by_id(db, recipe_id).await?;
    build_recipe_response(db, recipe, viewer, media_url).await
}

pub async fn build_recipe_response(
    db: &DatabaseConnection,
    recipe: recipe::Model,
    viewer: Option<i32>,
    media_url: &str,
) -> Result<RecipeResponse, AppError> {
    build_recipe_responses(db, vec![recipe], viewer, media_url)
        .await?
        .pop()
        .ok_or_else(|| AppError::InternalServerError("Recipe response was not built.".to_string()))
}

/// Assembles full recipe views for a batch of recipes with a fixed number of
/// queries, preserving the input order.
pub async fn build_recipe_responses(
    db: &DatabaseConnection,
    recipes: Vec<recipe::Model>,
    viewer: Option<i32>,
    media_url: &str,
) -> Result<Vec<RecipeResponse>, AppError> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let author_ids: Vec<i32> = recipes
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut tags_by_recipe: HashMap<i32, Vec<TagResponse>> = HashMap::new();
    for (link, tag) in recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.is_in(ids.clone()))
        .order_by_asc(recipe_tag::Column::TagId)
        .find_also_related(tag::Entity)
        .all(db)
        .await?
    {
        if let Some(tag) = tag {
            tags_by_recipe.entry(link.recipe_id).or_default().push(tag.into());
        }
    }

    let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredientResponse>> = HashMap::new();
    for (row, ingredient) in recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(ids.clone()))
        .order_by_asc(recipe_ingredient::Column::Id)
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?
    {
        if let Some(ingredient) = ingredient {
            ingredients_by_recipe
                .entry(row.recipe_id)
                .or_default()
                .push(RecipeIngredientResponse {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount: row.amount,
                });
        }
    }

    let authors: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let favorited = recipes_in_collection(db, RecipeCollection::Favorites, viewer, &ids).await?;
    let in_cart = recipes_in_collection(db, RecipeCollection::ShoppingCart, viewer, &ids).await?;
    let subscribed = subscribed_author_ids(db, viewer, &author_ids).await?;

    recipes
        .into_iter()
        .map(|recipe| {
            let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                AppError::InternalServerError(format!(
                    "Author {} of recipe {} is missing.",
                    recipe.author_id, recipe.id
                ))
            })?;
            Ok(RecipeResponse {
                id: recipe.id,
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                author: UserResponse::from_model(author, subscribed.contains(&recipe.author_id)),
                ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                name: recipe.name,
                image: recipe.image.map(|path| media_link(media_url, &path)),
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::test_support::{create_ingredient, create_tag, create_user, setup_db};
    use crate::db::services::add_to_collection;

    fn recipe_with(ingredients: Vec<IngredientAmount>, tag_ids: Vec<i32>) -> NewRecipe {
        NewRecipe {
            name: "Salad".to_string(),
            text: "Chop and mix.".to_string(),
            image: None,
            cooking_time: 15,
            tag_ids,
            ingredients,
        }
    }

    #[tokio::test]
    async fn test_create_recipe_keeps_ingredient_order() {
        let db = setup_db().await;
        let author = create_user(&db, "chef").await;
        let salt = create_ingredient(&db, "salt", "g").await;
        let pepper = create_ingredient(&db, "pepper", "g").await;
        let lunch = create_tag(&db, "lunch").await;

        let recipe = create_recipe(
            &db,
            author.id,
            recipe_with(
                vec![
                    IngredientAmount { id: pepper.id, amount: 2 },
                    IngredientAmount { id: salt.id, amount: 5 },
                ],
                vec![lunch.id],
            ),
        )
        .await
        .unwrap();

        let view = get_recipe_response(&db, recipe.id, None, "/media/").await.unwrap();
        let names: Vec<&str> = view.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["pepper", "salt"]);
        assert_eq!(view.tags.len(), 1);
        assert_eq!(view.tags[0].slug, "lunch");
        assert_eq!(view.author.id, author.id);
        assert!(!view.is_favorited);
    }

    #[tokio::test]
    async fn test_unknown_ingredient_is_not_found_and_nothing_persisted() {
        let db = setup_db().await;
        let author = create_user(&db, "chef").await;

        let result = create_recipe(
            &db,
            author.id,
            recipe_with(vec![IngredientAmount { id: 404, amount: 1 }], vec![]),
        )
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(recipe::Entity::find().all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tag_is_invalid_input() {
        let db = setup_db().await;
        let author = create_user(&db, "chef").await;
        let result = create_recipe(&db, author.id, recipe_with(vec![], vec![9])).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_ingredients() {
        assert!(validate_ingredients(&[IngredientAmount { id: 1, amount: 0 }]).is_err());
        assert!(validate_ingredients(&[
            IngredientAmount { id: 1, amount: 2 },
            IngredientAmount { id: 1, amount: 3 },
        ])
        .is_err());
        assert!(validate_ingredients(&[IngredientAmount { id: 1, amount: 2 }]).is_ok());
    }

    #[tokio::test]
    async fn test_non_positive_cooking_time_rejected() {
        let db = setup_db().await;
        let author = create_user(&db, "chef").await;
        let mut new_recipe = recipe_with(vec![], vec![]);
        new_recipe.cooking_time = 0;
        assert!(matches!(
            create_recipe(&db, author.id, new_recipe).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_partial_update_only_touches_given_fields() {
        let db = setup_db().await;
        let author = create_user(&db, "chef").await;
        let salt = create_ingredient(&db, "salt", "g").await;
        let recipe = create_recipe(
            &db,
            author.id,
            recipe_with(vec![IngredientAmount { id: salt.id, amount: 5 }], vec![]),
        )
        .await
        .unwrap();

        let (updated, replaced) = update_recipe(
            &db,
            recipe.id,
            author.id,
            RecipeChanges {
                name: Some("Better salad".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Better salad");
        assert_eq!(updated.text, recipe.text);
        assert_eq!(updated.cooking_time, recipe.cooking_time);
        assert!(replaced.is_none());
        let view = get_recipe_response(&db, recipe.id, None, "/media/").await.unwrap();
        assert_eq!(view.ingredients.len(), 1);
        assert_eq!(view.ingredients[0].amount, 5);
    }

    #[tokio::test]
    async fn test_updating_one_recipe_leaves_other_amounts_alone() {
        let db = setup_db().await;
        let author = create_user(&db, "chef").await;
        let salt = create_ingredient(&db, "salt", "g").await;
        let same = vec![IngredientAmount { id: salt.id, amount: 5 }];
        let a = create_recipe(&db, author.id, recipe_with(same.clone(), vec![])).await.unwrap();
        let b = create_recipe(&db, author.id, recipe_with(same, vec![])).await.unwrap();

        update_recipe(
            &db,
            a.id,
            author.id,
            RecipeChanges {
                ingredients: Some(vec![IngredientAmount { id: salt.id, amount: 50 }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let view_a = get_recipe_response(&db, a.id, None, "/media/").await.unwrap();
        let view_b = get_recipe_response(&db, b.id, None, "/media/").await.unwrap();
        assert_eq!(view_a.ingredients[0].amount, 50);
        assert_eq!(view_b.ingredients[0].amount, 5);
    }

    #[tokio::test]
    async fn test_only_author_may_modify() {
        let db = setup_db().await;
        let author = create_user(&db, "chef").await;
        let other = create_user(&db, "guest").await;
        let recipe = create_recipe(&db, author.id, recipe_with(vec![], vec![])).await.unwrap();

        let update = update_recipe(&db, recipe.id, other.id, RecipeChanges::default()).await;
        assert!(matches!(update, Err(AppError::Forbidden(_))));
        let delete = delete_recipe(&db, recipe.id, other.id).await;
        assert!(matches!(delete, Err(AppError::Forbidden(_))));

        delete_recipe(&db, recipe.id, author.id).await.unwrap();
        assert!(matches!(
            get_recipe_by_id(&db, recipe.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = setup_db().await;
        let chef = create_user(&db, "chef").await;
        let guest = create_user(&db, "guest").await;
        let lunch = create_tag(&db, "lunch").await;
        let dinner = create_tag(&db, "dinner").await;

        let a = create_recipe(&db, chef.id, recipe_with(vec![], vec![lunch.id])).await.unwrap();
        let b = create_recipe(&db, chef.id, recipe_with(vec![], vec![dinner.id])).await.unwrap();
        let c = create_recipe(&db, guest.id, recipe_with(vec![], vec![lunch.id, dinner.id]))
            .await
            .unwrap();
        add_to_collection(&db, RecipeCollection::Favorites, guest.id, a.id)
            .await
            .unwrap();

        let all = list_recipes(&db, None, &RecipeFilter::default(), PageRequest::default(), "/media/")
            .await
            .unwrap();
        let ids: Vec<i32> = all.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, [c.id, b.id, a.id]);

        let by_author = RecipeFilter {
            author_id: Some(chef.id),
            ..Default::default()
        };
        let page = list_recipes(&db, None, &by_author, PageRequest::default(), "/media/")
            .await
            .unwrap();
        assert_eq!(page.count, 2);

        let by_tag = RecipeFilter {
            tag_slugs: vec!["dinner".to_string()],
            ..Default::default()
        };
        let page = list_recipes(&db, None, &by_tag, PageRequest::default(), "/media/")
            .await
            .unwrap();
        let ids: Vec<i32> = page.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, [c.id, b.id]);

        let favorited = RecipeFilter {
            is_favorited: Some(true),
            ..Default::default()
        };
        let page = list_recipes(&db, Some(guest.id), &favorited, PageRequest::default(), "/media/")
            .await
            .unwrap();
        assert_eq!(page.count, 1);
        assert!(page.results[0].is_favorited);

        let not_favorited = RecipeFilter {
            is_favorited: Some(false),
            ..Default::default()
        };
        let page = list_recipes(&db, Some(guest.id), &not_favorited, PageRequest::default(), "/media/")
            .await
            .unwrap();
        assert_eq!(page.count, 2);
    }
}
