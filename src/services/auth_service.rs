use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::db::entities::user;
use crate::db::services::{NewUser, user_service};
use crate::server::config::ServerConfig;
use crate::web::error::AppError;
use crate::web::models::{Claims, LoginRequest, LoginResponse, RegisterRequest, UserResponse};

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub async fn register_user(
    pool: &DatabaseConnection,
    req: RegisterRequest,
    config: &ServerConfig,
) -> Result<UserResponse, AppError> {
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }

    let password_hash = hash(&req.password, config.bcrypt_cost)
        .map_err(|e| AppError::PasswordHashingError(e.to_string()))?;

    let user_model = user_service::create_user(
        pool,
        NewUser {
            email: req.email.trim().to_lowercase(),
            username: req.username.trim().to_string(),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            password_hash,
        },
    )
    .await?;
    info!(user_id = user_model.id, "User registered.");

    Ok(UserResponse {
        id: user_model.id,
        email: user_model.email,
        username: user_model.username,
        first_name: user_model.first_name,
        last_name: user_model.last_name,
    })
}

pub async fn login_user(
    pool: &DatabaseConnection,
    req: LoginRequest,
    jwt_secret: &str,
) -> Result<LoginResponse, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Email and password are required.".to_string(),
        ));
    }

    let user = user_service::get_user_by_email(pool, &req.email.trim().to_lowercase())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid_password = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !valid_password {
        return Err(AppError::InvalidCredentials);
    }

    create_jwt_for_user(&user, jwt_secret)
}

pub fn create_jwt_for_user(user: &user::Model, jwt_secret: &str) -> Result<LoginResponse, AppError> {
    let expiration = (Utc::now() + Duration::hours(24)).timestamp() as usize;

    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        exp: expiration,
    };

    let auth_token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::TokenCreationError(e.to_string()))?;

    Ok(LoginResponse { auth_token })
}
