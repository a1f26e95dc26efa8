use std::collections::HashSet;
use std::fmt;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, QueryFilter, QuerySelect,
    Set,
};
use tracing::info;

use crate::db::constraint;
use crate::db::entities::{favorite, prelude::Recipe, shopping_cart};
use crate::db::models::RecipeShort;

/// The per-user recipe lists that share the add/remove toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeCollection {
    Favorites,
    ShoppingCart,
}

impl fmt::Display for RecipeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeCollection::Favorites => write!(f, "favorites"),
            RecipeCollection::ShoppingCart => write!(f, "shopping cart"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Recipe with ID {0} not found")]
    RecipeNotFound(i32),
    #[error("Recipe is already in {0}.")]
    AlreadyAdded(RecipeCollection),
    #[error("Recipe is not in {0}.")]
    NotPresent(RecipeCollection),
}

/// A (user, recipe) link table.
trait UserRecipeLink: EntityTrait {
    fn user_column() -> Self::Column;
    fn recipe_column() -> Self::Column;
    fn new_link(user_id: i32, recipe_id: i32) -> Self::ActiveModel;
}

impl UserRecipeLink for favorite::Entity {
    fn user_column() -> Self::Column {
        favorite::Column::UserId
    }
    fn recipe_column() -> Self::Column {
        favorite::Column::RecipeId
    }
    fn new_link(user_id: i32, recipe_id: i32) -> Self::ActiveModel {
        favorite::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            ..Default::default()
        }
    }
}

impl UserRecipeLink for shopping_cart::Entity {
    fn user_column() -> Self::Column {
        shopping_cart::Column::UserId
    }
    fn recipe_column() -> Self::Column {
        shopping_cart::Column::RecipeId
    }
    fn new_link(user_id: i32, recipe_id: i32) -> Self::ActiveModel {
        shopping_cart::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            ..Default::default()
        }
    }
}

/// Adds a recipe to one of the user's collections and returns its short form.
pub async fn add<C: ConnectionTrait>(
    db: &C,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> Result<RecipeShort, CollectionError> {
    let recipe = Recipe::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or(CollectionError::RecipeNotFound(recipe_id))?;

    match collection {
        RecipeCollection::Favorites => {
            add_link::<favorite::Entity, _>(db, collection, user_id, recipe_id).await?
        }
        RecipeCollection::ShoppingCart => {
            add_link::<shopping_cart::Entity, _>(db, collection, user_id, recipe_id).await?
        }
    }
    info!(user_id, recipe_id, %collection, "Recipe added.");
    Ok(RecipeShort::from(&recipe))
}

pub async fn remove<C: ConnectionTrait>(
    db: &C,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), CollectionError> {
    Recipe::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or(CollectionError::RecipeNotFound(recipe_id))?;

    let removed = match collection {
        RecipeCollection::Favorites => {
            remove_link::<favorite::Entity, _>(db, user_id, recipe_id).await?
        }
        RecipeCollection::ShoppingCart => {
            remove_link::<shopping_cart::Entity, _>(db, user_id, recipe_id).await?
        }
    };
    if removed == 0 {
        return Err(CollectionError::NotPresent(collection));
    }
    info!(user_id, recipe_id, %collection, "Recipe removed.");
    Ok(())
}

/// Returns the subset of `recipe_ids` present in the user's collection.
pub async fn recipe_ids_in<C: ConnectionTrait>(
    db: &C,
    collection: RecipeCollection,
    user_id: i32,
    recipe_ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }
    match collection {
        RecipeCollection::Favorites => {
            linked_ids::<favorite::Entity, _>(db, user_id, recipe_ids).await
        }
        RecipeCollection::ShoppingCart => {
            linked_ids::<shopping_cart::Entity, _>(db, user_id, recipe_ids).await
        }
    }
}

async fn add_link<E: UserRecipeLink, C: ConnectionTrait>(
    db: &C,
    collection: RecipeCollection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), CollectionError>
where
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    let existing = E::find()
        .filter(E::user_column().eq(user_id))
        .filter(E::recipe_column().eq(recipe_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(CollectionError::AlreadyAdded(collection));
    }

    E::insert(E::new_link(user_id, recipe_id))
        .exec_without_returning(db)
        .await
        .map_err(|e| {
            if constraint::is_unique_violation(&e) {
                CollectionError::AlreadyAdded(collection)
            } else {
                CollectionError::DbErr(e)
            }
        })?;
    Ok(())
}

async fn remove_link<E: UserRecipeLink, C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_id: i32,
) -> Result<u64, DbErr> {
    let result = E::delete_many()
        .filter(E::user_column().eq(user_id))
        .filter(E::recipe_column().eq(recipe_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

async fn linked_ids<E: UserRecipeLink, C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    recipe_ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    let ids: Vec<i32> = E::find()
        .select_only()
        .column(E::recipe_column())
        .filter(E::user_column().eq(user_id))
        .filter(E::recipe_column().is_in(recipe_ids.to_vec()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}
