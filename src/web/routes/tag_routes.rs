use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::db::entities::tag;
use crate::db::services::{TagError, tag_service};
use crate::web::models::CreateTagRequest;
use crate::web::{AppError, AppState};

impl From<TagError> for AppError {
    fn from(err: TagError) -> Self {
        match err {
            TagError::NotFound(_) => AppError::NotFound(err.to_string()),
            TagError::Invalid(_) | TagError::DuplicateSlug(_) => {
                AppError::InvalidInput(err.to_string())
            }
            TagError::DbErr(e) => AppError::DatabaseError(e.to_string()),
        }
    }
}

pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tags))
        .route("/{id}", get(get_tag))
}

pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_tag))
        .route("/{id}", delete(delete_tag))
}

async fn list_tags(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<tag::Model>>, AppError> {
    let tags = tag_service::list_tags(&app_state.db_pool).await?;
    Ok(Json(tags))
}

async fn get_tag(
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<Json<tag::Model>, AppError> {
    Ok(Json(tag_service::get_tag(&app_state.db_pool, tag_id).await?))
}

async fn create_tag(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<tag::Model>), AppError> {
    let tag = tag_service::create_tag(
        &app_state.db_pool,
        payload.name,
        payload.color,
        payload.slug,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn delete_tag(
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    tag_service::delete_tag(&app_state.db_pool, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
