mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use foodgram::server::config::ServerConfig;
use foodgram::web::create_axum_router;

use common::setup_db;

fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        log_dir: "logs".to_string(),
        max_connections: 1,
        page_size: 6,
        cors_origin: None,
        bcrypt_cost: 4,
    }
}

async fn test_app() -> Router {
    let db = setup_db().await;
    create_axum_router(db, Arc::new(test_config()))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

/// Registers a user and returns `(id, token)`.
async fn sign_up(app: &Router, username: &str) -> (i64, String) {
    let (status, user) = send(
        app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({
            "email": format!("{username}@example.com"),
            "username": username,
            "first_name": "Test",
            "last_name": "Cook",
            "password": "correct-horse",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");

    let (status, login) = send(
        app,
        Method::POST,
        "/api/auth/token/login",
        None,
        Some(json!({
            "email": format!("{username}@example.com"),
            "password": "correct-horse",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{login}");
    (
        user["id"].as_i64().unwrap(),
        login["auth_token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_check() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = test_app().await;
    sign_up(&app, "cook").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/token/login",
        None,
        Some(json!({ "email": "cook@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn registration_validates_input() {
    let app = test_app().await;
    sign_up(&app, "cook").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({
            "email": "cook@example.com",
            "username": "another",
            "first_name": "A",
            "last_name": "B",
            "password": "long-enough",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({
            "email": "short@example.com",
            "username": "short",
            "first_name": "A",
            "last_name": "B",
            "password": "short",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn subscription_endpoints() {
    let app = test_app().await;
    let (reader_id, reader_token) = sign_up(&app, "reader").await;
    let (author_id, _) = sign_up(&app, "author").await;
    let subscribe_uri = format!("/api/users/{author_id}/subscribe");

    let (status, _) = send(&app, Method::POST, &subscribe_uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::POST, &subscribe_uri, Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"].as_i64(), Some(author_id));
    assert_eq!(body["is_subscribed"], Value::Bool(true));
    assert_eq!(body["recipes_count"].as_u64(), Some(0));

    let (status, _) = send(&app, Method::POST, &subscribe_uri, Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let self_uri = format!("/api/users/{reader_id}/subscribe");
    let (status, _) = send(&app, Method::POST, &self_uri, Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/users/9999/subscribe",
        Some(&reader_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, page) = send(
        &app,
        Method::GET,
        "/api/users/subscriptions",
        Some(&reader_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"].as_u64(), Some(1));
    assert_eq!(page["results"][0]["id"].as_i64(), Some(author_id));

    let (status, profile) = send(
        &app,
        Method::GET,
        &format!("/api/users/{author_id}"),
        Some(&reader_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["is_subscribed"], Value::Bool(true));

    let (status, _) = send(&app, Method::DELETE, &subscribe_uri, Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, &subscribe_uri, Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recipe_lifecycle() {
    let app = test_app().await;
    let (_, author_token) = sign_up(&app, "author").await;
    let (_, guest_token) = sign_up(&app, "guest").await;

    let (status, tag) = send(
        &app,
        Method::POST,
        "/api/tags",
        Some(&author_token),
        Some(json!({ "name": "Breakfast", "color": "#E26C2D", "slug": "breakfast" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, flour) = send(
        &app,
        Method::POST,
        "/api/ingredients",
        Some(&author_token),
        Some(json!({ "name": "flour", "measurement_unit": "g" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let recipe_body = json!({
        "name": "Pancakes",
        "image": "recipes/images/pancakes.png",
        "text": "Whisk and fry.",
        "cooking_time": 20,
        "ingredients": [{ "id": flour["id"], "amount": 30 }],
        "tags": [tag["id"]],
    });

    let (status, _) = send(&app, Method::POST, "/api/recipes", None, Some(recipe_body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, recipe) = send(
        &app,
        Method::POST,
        "/api/recipes",
        Some(&author_token),
        Some(recipe_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{recipe}");
    assert_eq!(recipe["ingredients"][0]["measurement_unit"], "g");
    assert_eq!(recipe["tags"][0]["slug"], "breakfast");
    let recipe_uri = format!("/api/recipes/{}", recipe["id"]);

    let (status, listing) = send(&app, Method::GET, "/api/recipes?tags=breakfast", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"].as_u64(), Some(1));
    assert_eq!(listing["results"][0]["is_favorited"], Value::Bool(false));

    let mut edit = recipe_body.clone();
    edit["name"] = json!("Stolen pancakes");
    let (status, _) = send(&app, Method::PATCH, &recipe_uri, Some(&guest_token), Some(edit)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let favorite_uri = format!("{recipe_uri}/favorite");
    let (status, short) = send(&app, Method::POST, &favorite_uri, Some(&guest_token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(short["name"], "Pancakes");
    let (status, _) = send(&app, Method::POST, &favorite_uri, Some(&guest_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, favorites) = send(
        &app,
        Method::GET,
        "/api/recipes?is_favorited=1",
        Some(&guest_token),
        None,
    )
    .await;
    assert_eq!(favorites["count"].as_u64(), Some(1));
    assert_eq!(favorites["results"][0]["is_favorited"], Value::Bool(true));

    let cart_uri = format!("{recipe_uri}/shopping_cart");
    let (status, _) = send(&app, Method::POST, &cart_uri, Some(&guest_token), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let request = Request::builder()
        .uri("/api/recipes/download_shopping_cart")
        .header(header::AUTHORIZATION, format!("Bearer {guest_token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"shopping_list.txt\""
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"flour (g) - 30\n");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/ingredients/{}", flour["id"]),
        Some(&author_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::DELETE, &recipe_uri, Some(&author_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &recipe_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &cart_uri, Some(&guest_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let app = test_app().await;
    let (id, token) = sign_up(&app, "cook").await;

    let (status, _) = send(&app, Method::GET, "/api/users/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = send(&app, Method::GET, "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"].as_i64(), Some(id));
    assert!(me.get("password_hash").is_none());

    let (status, users) = send(&app, Method::GET, "/api/users?limit=1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["count"].as_u64(), Some(1));
    assert_eq!(users["next"], Value::Null);
}

#[tokio::test]
async fn oversized_page_numbers_are_rejected() {
    let app = test_app().await;
    let (_, token) = sign_up(&app, "cook").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/recipes?page=18446744073709551615&limit=100",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/users?page=9223372036854775807&limit=2",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/users/subscriptions?page=18446744073709551615",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, page) = send(
        &app,
        Method::GET,
        "/api/users?page=9223372036854775807&limit=1",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["results"], json!([]));
    assert_eq!(page["count"].as_u64(), Some(1));
}

#[tokio::test]
async fn huge_recipes_limit_is_clamped() {
    let app = test_app().await;
    let (_, reader_token) = sign_up(&app, "reader").await;
    let (author_id, _) = sign_up(&app, "author").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/users/{author_id}/subscribe?recipes_limit=18446744073709551615"),
        Some(&reader_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, page) = send(
        &app,
        Method::GET,
        "/api/users/subscriptions?recipes_limit=18446744073709551615",
        Some(&reader_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"].as_u64(), Some(1));
}
