use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::server::config::ServerConfig;
use crate::services::auth_service;
use crate::web::{
    middleware::auth,
    models::{LoginRequest, LoginResponse},
    routes::*,
};

pub use crate::web::error::AppError;

pub mod error;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let login_response =
        auth_service::login_user(&app_state.db_pool, payload, &app_state.config.jwt_secret).await?;

    let auth_cookie = Cookie::build(("token", login_response.auth_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();

    Ok((jar.add(auth_cookie), Json(login_response)))
}

async fn logout_handler(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build("token").path("/")),
        StatusCode::NO_CONTENT,
    )
}

async fn health_check_handler() -> &'static str {
    "OK"
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let allow_origin = match config.cors_origin.as_deref() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!(origin, error = %e, "Invalid CORS origin configured, allowing any origin.");
                AllowOrigin::from(Any)
            }
        },
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn create_axum_router(db_pool: DatabaseConnection, config: Arc<ServerConfig>) -> Router {
    let cors = cors_layer(&config);
    let app_state = Arc::new(AppState { db_pool, config });

    let require_auth = || axum_middleware::from_fn_with_state(app_state.clone(), auth::auth);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/api/auth/token/login", post(login_handler))
        .route(
            "/api/auth/token/logout",
            post(logout_handler).route_layer(require_auth()),
        )
        .nest(
            "/api/users",
            user_routes::create_public_router()
                .merge(user_routes::create_protected_router().route_layer(require_auth())),
        )
        .nest(
            "/api/tags",
            tag_routes::create_public_router()
                .merge(tag_routes::create_protected_router().route_layer(require_auth())),
        )
        .nest(
            "/api/ingredients",
            ingredient_routes::create_public_router()
                .merge(ingredient_routes::create_protected_router().route_layer(require_auth())),
        )
        .nest(
            "/api/recipes",
            recipe_routes::create_public_router()
                .merge(recipe_routes::create_protected_router().route_layer(require_auth())),
        )
        .with_state(app_state.clone())
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth::optional_auth,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
