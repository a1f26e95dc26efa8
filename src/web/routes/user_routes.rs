use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

use crate::db::models::{AuthorSummary, UserProfile};
use crate::db::services::{FollowError, FollowService, UserError, user_service};
use crate::services::auth_service;
use crate::web::models::{AuthenticatedUser, RecipesLimitQuery, RegisterRequest, UserResponse};
use crate::web::pagination::{Page, PageParams};
use crate::web::{AppError, AppState};

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => AppError::NotFound(err.to_string()),
            UserError::DuplicateEmail | UserError::DuplicateUsername | UserError::Invalid(_) => {
                AppError::InvalidInput(err.to_string())
            }
            UserError::DbErr(e) => AppError::DatabaseError(e.to_string()),
        }
    }
}

impl From<FollowError> for AppError {
    fn from(err: FollowError) -> Self {
        match err {
            FollowError::AuthorNotFound(_) => AppError::NotFound(err.to_string()),
            FollowError::SelfFollow | FollowError::AlreadySubscribed | FollowError::NotSubscribed => {
                AppError::InvalidInput(err.to_string())
            }
            FollowError::DbErr(e) => AppError::DatabaseError(e.to_string()),
        }
    }
}

pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(register).get(list_users))
        .route("/{id}", get(get_profile))
}

pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(me))
        .route("/subscriptions", get(list_subscriptions))
        .route("/{id}/subscribe", post(subscribe).delete(unsubscribe))
}

async fn register(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = auth_service::register_user(&app_state.db_pool, payload, &app_state.config).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(
    State(app_state): State<Arc<AppState>>,
    viewer: Option<Extension<AuthenticatedUser>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<UserProfile>>, AppError> {
    let (page, limit) = params.resolve(app_state.config.page_size)?;
    let (users, total) = user_service::list_users(&app_state.db_pool, page, limit).await?;
    let viewer_id = viewer.map(|Extension(user)| user.id);
    let profiles = user_service::profiles(&app_state.db_pool, viewer_id, &users).await?;
    Ok(Json(Page::new(profiles, total, page, limit)))
}

async fn get_profile(
    State(app_state): State<Arc<AppState>>,
    viewer: Option<Extension<AuthenticatedUser>>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserProfile>, AppError> {
    let user = user_service::get_user_by_id(&app_state.db_pool, user_id).await?;
    let viewer_id = viewer.map(|Extension(user)| user.id);
    let profile = user_service::profiles(&app_state.db_pool, viewer_id, std::slice::from_ref(&user))
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("User with ID {user_id} not found")))?;
    Ok(Json(profile))
}

async fn me(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<UserProfile>, AppError> {
    let user = user_service::get_user_by_id(&app_state.db_pool, user.id)
        .await
        .map_err(|e| match e {
            UserError::NotFound(_) => AppError::Unauthorized("User no longer exists.".to_string()),
            other => other.into(),
        })?;
    Ok(Json(UserProfile::from_user(&user, false)))
}

async fn list_subscriptions(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<PageParams>,
    Query(recipes): Query<RecipesLimitQuery>,
) -> Result<Json<Page<AuthorSummary>>, AppError> {
    let (page, limit) = params.resolve(app_state.config.page_size)?;
    let (authors, total) = FollowService::list_subscriptions(
        &app_state.db_pool,
        user.id,
        page,
        limit,
        recipes.recipes_limit,
    )
    .await?;
    Ok(Json(Page::new(authors, total, page, limit)))
}

async fn subscribe(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(author_id): Path<i32>,
    Query(recipes): Query<RecipesLimitQuery>,
) -> Result<(StatusCode, Json<AuthorSummary>), AppError> {
    let summary =
        FollowService::subscribe(&app_state.db_pool, user.id, author_id, recipes.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn unsubscribe(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(author_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    FollowService::unsubscribe(&app_state.db_pool, user.id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
