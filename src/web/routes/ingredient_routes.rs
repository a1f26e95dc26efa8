use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::db::entities::ingredient;
use crate::db::services::{IngredientError, ingredient_service};
use crate::web::models::{CreateIngredientRequest, IngredientQuery};
use crate::web::{AppError, AppState};

impl From<IngredientError> for AppError {
    fn from(err: IngredientError) -> Self {
        match err {
            IngredientError::NotFound(_) => AppError::NotFound(err.to_string()),
            IngredientError::Invalid(_) | IngredientError::Protected(_) => {
                AppError::InvalidInput(err.to_string())
            }
            IngredientError::DbErr(e) => AppError::DatabaseError(e.to_string()),
        }
    }
}

pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_ingredients))
        .route("/{id}", get(get_ingredient))
}

pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_ingredient))
        .route("/{id}", delete(delete_ingredient))
}

async fn list_ingredients(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<Vec<ingredient::Model>>, AppError> {
    let ingredients =
        ingredient_service::list_ingredients(&app_state.db_pool, query.name.as_deref()).await?;
    Ok(Json(ingredients))
}

async fn get_ingredient(
    State(app_state): State<Arc<AppState>>,
    Path(ingredient_id): Path<i32>,
) -> Result<Json<ingredient::Model>, AppError> {
    Ok(Json(
        ingredient_service::get_ingredient(&app_state.db_pool, ingredient_id).await?,
    ))
}

async fn create_ingredient(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<ingredient::Model>), AppError> {
    let ingredient = ingredient_service::create_ingredient(
        &app_state.db_pool,
        payload.name,
        payload.measurement_unit,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

async fn delete_ingredient(
    State(app_state): State<Arc<AppState>>,
    Path(ingredient_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    ingredient_service::delete_ingredient(&app_state.db_pool, ingredient_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
