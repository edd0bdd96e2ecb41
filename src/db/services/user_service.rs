use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::db::entities::user;
use crate::db::services::{fetch_page, subscribed_author_ids};
use crate::web::error::AppError;
use crate::web::models::{PageRequest, Paginated, UserResponse};

// --- User Service Functions ---

pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Creates a new user. A taken email is reported as a conflict.
pub async fn create_user(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model, AppError> {
    if get_user_by_email(db, &new_user.email).await?.is_some() {
        return Err(AppError::Conflict(
            "A user with this email already exists.".to_string(),
        ));
    }

    let model = user::ActiveModel {
        email: Set(new_user.email),
        username: Set(new_user.username),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        password_hash: Set(new_user.password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "A user with this email already exists."))?;

    info!(user_id = model.id, "User registered.");
    Ok(model)
}

/// Retrieves a user by id, or `NotFound`.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found.")))
}

/// Retrieves a user by their login email.
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

pub async fn update_password_hash(
    db: &DatabaseConnection,
    user: user::Model,
    password_hash: String,
) -> Result<(), DbErr> {
    let mut active = user.into_active_model();
    active.password_hash = Set(password_hash);
    active.update(db).await?;
    Ok(())
}

/// A user as seen by `viewer`.
pub async fn get_user_response(
    db: &DatabaseConnection,
    user_id: i32,
    viewer: Option<i32>,
) -> Result<UserResponse, AppError> {
    let user = get_user_by_id(db, user_id).await?;
    let subscribed = subscribed_author_ids(db, viewer, &[user.id]).await?;
    let is_subscribed = subscribed.contains(&user.id);
    Ok(UserResponse::from_model(user, is_subscribed))
}

pub async fn list_users(
    db: &DatabaseConnection,
    viewer: Option<i32>,
    page: PageRequest,
) -> Result<Paginated<UserResponse>, AppError> {
    let select = user::Entity::find().order_by_asc(user::Column::Id);
    let (users, count) = fetch_page(db, select, page).await?;

    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let subscribed = subscribed_author_ids(db, viewer, &ids).await?;

    let results = users
        .into_iter()
        .map(|u| {
            let is_subscribed = subscribed.contains(&u.id);
            UserResponse::from_model(u, is_subscribed)
        })
        .collect();
    Ok(Paginated::new(results, count, page))
}
