#![allow(dead_code)]

use foodgram::db::entities::{ingredient, recipe, tag, user};
use foodgram::db::migration::{Migrator, MigratorTrait};
use foodgram::db::services::{
    IngredientAmount, NewUser, RecipeDraft, RecipeService, ingredient_service, tag_service,
    user_service,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tempfile::TempDir;

/// Fresh in-memory database with the full schema applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// File-backed database behind a multi-connection pool, for tests that need
/// several writers at once. Keep the returned directory alive for the test.
pub async fn setup_shared_db() -> (TempDir, DatabaseConnection) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("foodgram.db").display());
    let mut options = ConnectOptions::new(url);
    options.max_connections(8).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    (dir, db)
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user_service::create_user(
        db,
        NewUser {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "Cook".to_string(),
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn create_ingredient(
    db: &DatabaseConnection,
    name: &str,
    unit: &str,
) -> ingredient::Model {
    ingredient_service::create_ingredient(db, name.to_string(), unit.to_string())
        .await
        .unwrap()
}

pub async fn create_tag(db: &DatabaseConnection, slug: &str) -> tag::Model {
    tag_service::create_tag(db, slug.to_uppercase(), "#E26C2D".to_string(), slug.to_string())
        .await
        .unwrap()
}

pub fn draft(name: &str, ingredients: &[(i32, i32)], tags: &[i32]) -> RecipeDraft {
    RecipeDraft {
        name: name.to_string(),
        image: format!("recipes/images/{}.png", name.to_lowercase()),
        text: "Mix everything and wait.".to_string(),
        cooking_time: 30,
        ingredients: ingredients
            .iter()
            .map(|&(id, amount)| IngredientAmount { id, amount })
            .collect(),
        tags: tags.to_vec(),
    }
}

pub async fn create_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    name: &str,
    ingredients: &[(i32, i32)],
    tags: &[i32],
) -> recipe::Model {
    RecipeService::create_recipe(db, author_id, draft(name, ingredients, tags))
        .await
        .unwrap()
}
