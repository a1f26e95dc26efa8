use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::Query as MultiQuery;
use std::sync::Arc;

use crate::db::models::{RecipeDetail, RecipeShort};
use crate::db::services::{
    CollectionError, RecipeCollection, RecipeDraft, RecipeError, RecipeFilter, RecipeService,
    collection_service, shopping_list_service,
};
use crate::web::models::{AuthenticatedUser, RecipePayload, RecipeQuery};
use crate::web::pagination::{Page, PageParams};
use crate::web::{AppError, AppState};

impl From<RecipeError> for AppError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::NotFound(_) => AppError::NotFound(err.to_string()),
            RecipeError::Forbidden => AppError::Forbidden(err.to_string()),
            RecipeError::Invalid(_)
            | RecipeError::UnknownIngredient(_)
            | RecipeError::UnknownTag(_) => AppError::InvalidInput(err.to_string()),
            RecipeError::DbErr(e) => AppError::DatabaseError(e.to_string()),
        }
    }
}

impl From<CollectionError> for AppError {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::RecipeNotFound(_) => AppError::NotFound(err.to_string()),
            CollectionError::AlreadyAdded(_) | CollectionError::NotPresent(_) => {
                AppError::InvalidInput(err.to_string())
            }
            CollectionError::DbErr(e) => AppError::DatabaseError(e.to_string()),
        }
    }
}

impl From<RecipePayload> for RecipeDraft {
    fn from(payload: RecipePayload) -> Self {
        RecipeDraft {
            name: payload.name,
            image: payload.image,
            text: payload.text,
            cooking_time: payload.cooking_time,
            ingredients: payload.ingredients,
            tags: payload.tags,
        }
    }
}

pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_recipes))
        .route("/{id}", get(get_recipe))
}

pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_recipe))
        .route("/download_shopping_cart", get(download_shopping_cart))
        .route("/{id}", patch(update_recipe).delete(delete_recipe))
        .route("/{id}/favorite", post(add_favorite).delete(remove_favorite))
        .route(
            "/{id}/shopping_cart",
            post(add_to_shopping_cart).delete(remove_from_shopping_cart),
        )
}

async fn list_recipes(
    State(app_state): State<Arc<AppState>>,
    viewer: Option<Extension<AuthenticatedUser>>,
    Query(params): Query<PageParams>,
    MultiQuery(query): MultiQuery<RecipeQuery>,
) -> Result<Json<Page<RecipeDetail>>, AppError> {
    let viewer_id = viewer.map(|Extension(user)| user.id);
    let (page, limit) = params.resolve(app_state.config.page_size)?;

    // Collection filters only apply to signed-in users.
    let filter = RecipeFilter {
        author_id: query.author,
        tag_slugs: query.tags,
        favorited_by: viewer_id.filter(|_| query.is_favorited == Some(1)),
        in_cart_of: viewer_id.filter(|_| query.is_in_shopping_cart == Some(1)),
    };

    let (recipes, total) =
        RecipeService::list_recipes(&app_state.db_pool, &filter, page, limit).await?;
    let details = RecipeService::recipe_details(&app_state.db_pool, viewer_id, recipes).await?;
    Ok(Json(Page::new(details, total, page, limit)))
}

async fn get_recipe(
    State(app_state): State<Arc<AppState>>,
    viewer: Option<Extension<AuthenticatedUser>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeDetail>, AppError> {
    let viewer_id = viewer.map(|Extension(user)| user.id);
    let recipe = RecipeService::get_recipe(&app_state.db_pool, recipe_id).await?;
    let detail = RecipeService::recipe_detail(&app_state.db_pool, viewer_id, recipe).await?;
    Ok(Json(detail))
}

async fn create_recipe(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeDetail>), AppError> {
    let recipe = RecipeService::create_recipe(&app_state.db_pool, user.id, payload.into()).await?;
    let detail = RecipeService::recipe_detail(&app_state.db_pool, Some(user.id), recipe).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn update_recipe(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<RecipeDetail>, AppError> {
    let recipe =
        RecipeService::update_recipe(&app_state.db_pool, recipe_id, user.id, payload.into())
            .await?;
    let detail = RecipeService::recipe_detail(&app_state.db_pool, Some(user.id), recipe).await?;
    Ok(Json(detail))
}

async fn delete_recipe(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    RecipeService::delete_recipe(&app_state.db_pool, recipe_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_collection(
    app_state: &AppState,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(StatusCode, Json<RecipeShort>), AppError> {
    let recipe = collection_service::add(&app_state.db_pool, collection, user_id, recipe_id).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn remove_from_collection(
    app_state: &AppState,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> Result<StatusCode, AppError> {
    collection_service::remove(&app_state.db_pool, collection, user_id, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_favorite(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShort>), AppError> {
    add_to_collection(&app_state, RecipeCollection::Favorites, user.id, recipe_id).await
}

async fn remove_favorite(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    remove_from_collection(&app_state, RecipeCollection::Favorites, user.id, recipe_id).await
}

async fn add_to_shopping_cart(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShort>), AppError> {
    add_to_collection(&app_state, RecipeCollection::ShoppingCart, user.id, recipe_id).await
}

async fn remove_from_shopping_cart(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    remove_from_collection(&app_state, RecipeCollection::ShoppingCart, user.id, recipe_id).await
}

async fn download_shopping_cart(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, AppError> {
    let items = shopping_list_service::shopping_list(&app_state.db_pool, user.id).await?;
    let body = shopping_list_service::render(&items);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        shopping_list_service::SHOPPING_LIST_FILENAME
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
