use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::db::constraint::{self, ConstraintViolation};
use crate::db::entities::{ingredient, prelude::Ingredient, recipe_ingredient};

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_UNIT_LENGTH: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum IngredientError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Ingredient with ID {0} not found")]
    NotFound(i32),
    #[error("{0}")]
    Invalid(String),
    #[error("Ingredient '{0}' is used by existing recipes and cannot be deleted.")]
    Protected(String),
}

/// Lists ingredients ordered by name, optionally keeping only names that
/// start with `name_prefix` (case-insensitive).
///
/// The prefix is compared literally after Unicode lowercasing in Rust.
/// SQLite's `lower()` and `LIKE` only fold ASCII, which would miss
/// Cyrillic names such as "Мука" for the prefix "мук".
pub async fn list_ingredients<C: ConnectionTrait>(
    db: &C,
    name_prefix: Option<&str>,
) -> Result<Vec<ingredient::Model>, DbErr> {
    let ingredients = Ingredient::find()
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await?;
    match name_prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prefix) => {
            let prefix = prefix.to_lowercase();
            Ok(ingredients
                .into_iter()
                .filter(|i| starts_with_folded(&i.name, &prefix))
                .collect())
        }
        None => Ok(ingredients),
    }
}

pub async fn get_ingredient<C: ConnectionTrait>(
    db: &C,
    ingredient_id: i32,
) -> Result<ingredient::Model, IngredientError> {
    Ingredient::find_by_id(ingredient_id)
        .one(db)
        .await?
        .ok_or(IngredientError::NotFound(ingredient_id))
}

pub async fn create_ingredient<C: ConnectionTrait>(
    db: &C,
    name: String,
    measurement_unit: String,
) -> Result<ingredient::Model, IngredientError> {
    let name = name.trim().to_string();
    let measurement_unit = measurement_unit.trim().to_string();
    validate(&name, &measurement_unit)?;

    let active_ingredient = ingredient::ActiveModel {
        name: Set(name),
        measurement_unit: Set(measurement_unit),
        ..Default::default()
    };
    Ok(active_ingredient.insert(db).await?)
}

/// Deletes an ingredient nobody uses. Ingredients referenced by a recipe are
/// protected; the foreign key refuses the delete even if a recipe picks the
/// ingredient up between the check and the delete.
pub async fn delete_ingredient<C: ConnectionTrait>(
    db: &C,
    ingredient_id: i32,
) -> Result<(), IngredientError> {
    let ingredient = get_ingredient(db, ingredient_id).await?;

    let usages = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::IngredientId.eq(ingredient_id))
        .count(db)
        .await?;
    if usages > 0 {
        return Err(IngredientError::Protected(ingredient.name));
    }

    let name = ingredient.name.clone();
    ingredient.delete(db).await.map_err(|e| match constraint::violation(&e) {
        Some(ConstraintViolation::ForeignKey) => IngredientError::Protected(name.clone()),
        _ => IngredientError::DbErr(e),
    })?;
    info!(ingredient_id, name = %name, "Ingredient deleted.");
    Ok(())
}

fn validate(name: &str, measurement_unit: &str) -> Result<(), IngredientError> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(IngredientError::Invalid(format!(
            "Ingredient name must be between 1 and {MAX_NAME_LENGTH} characters."
        )));
    }
    if measurement_unit.is_empty() || measurement_unit.chars().count() > MAX_UNIT_LENGTH {
        return Err(IngredientError::Invalid(format!(
            "Measurement unit must be between 1 and {MAX_UNIT_LENGTH} characters."
        )));
    }
    Ok(())
}

/// `lowered_prefix` must already be lowercase.
fn starts_with_folded(name: &str, lowered_prefix: &str) -> bool {
    name.to_lowercase().starts_with(lowered_prefix)
}
