use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::db::entities::user;
use crate::db::services::user_service::{self, NewUser};
use crate::web::error::AppError;
use crate::web::models::{
    AuthenticatedUser, Claims, LoginRequest, RegisterRequest, SetPasswordRequest, TokenResponse,
    UserResponse,
};

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_FIELD_LEN: usize = 150;
const TOKEN_TTL_HOURS: i64 = 24;

fn require_field(name: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("'{name}' must not be empty.")));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::InvalidInput(format!(
            "'{name}' must be at most {MAX_FIELD_LEN} characters."
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long."
        )));
    }
    Ok(())
}

fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::PasswordHashingError(e.to_string()))
}

pub async fn register_user(
    db: &DatabaseConnection,
    req: RegisterRequest,
    bcrypt_cost: u32,
) -> Result<UserResponse, AppError> {
    require_field("email", &req.email)?;
    require_field("username", &req.username)?;
    require_field("first_name", &req.first_name)?;
    require_field("last_name", &req.last_name)?;
    if !req.email.contains('@') {
        return Err(AppError::InvalidInput("Enter a valid email address.".to_string()));
    }
    validate_password(&req.password)?;

    let password_hash = hash_password(&req.password, bcrypt_cost)?;
    let user_model = user_service::create_user(
        db,
        NewUser {
            email: req.email.trim().to_string(),
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            password_hash,
        },
    )
    .await?;

    Ok(UserResponse::from_model(user_model, false))
}

pub async fn login_user(
    db: &DatabaseConnection,
    req: LoginRequest,
    jwt_secret: &str,
) -> Result<TokenResponse, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Email and password must not be empty.".to_string(),
        ));
    }

    let user = user_service::get_user_by_email(db, req.email.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid_password = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !valid_password {
        warn!(user_id = user.id, "Login attempt with a wrong password.");
        return Err(AppError::InvalidCredentials);
    }

    let auth_token = create_jwt_for_user(&user, jwt_secret)?;
    info!(user_id = user.id, "User logged in.");
    Ok(TokenResponse { auth_token })
}

pub fn create_jwt_for_user(user: &user::Model, jwt_secret: &str) -> Result<String, AppError> {
    let expiration = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;

    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::TokenCreationError(e.to_string()))
}

/// Validates the signature and expiry of `token`.
pub fn decode_token(token: &str, jwt_secret: &str) -> Result<AuthenticatedUser, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!(error = ?e, "JWT decoding error.");
        AppError::Unauthorized("Invalid token.".to_string())
    })?;

    Ok(AuthenticatedUser {
        id: token_data.claims.user_id,
        email: token_data.claims.sub,
    })
}

pub async fn set_password(
    db: &DatabaseConnection,
    user_id: i32,
    req: SetPasswordRequest,
    bcrypt_cost: u32,
) -> Result<(), AppError> {
    let user = user_service::get_user_by_id(db, user_id).await?;

    let valid_password = verify(&req.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !valid_password {
        return Err(AppError::InvalidInput("Current password is incorrect.".to_string()));
    }
    validate_password(&req.new_password)?;

    let new_hash = hash_password(&req.new_password, bcrypt_cost)?;
    user_service::update_password_hash(db, user, new_hash).await?;
    info!(user_id, "Password changed.");
    Ok(())
}
