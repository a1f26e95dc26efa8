use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::info;

use crate::db::entities::{
    favorite, ingredient, prelude::Recipe, recipe, recipe_ingredient, recipe_tag, shopping_cart,
    tag, user,
};
use crate::db::models::{RecipeDetail, RecipeIngredientAmount, UserProfile};
use crate::db::services::collection_service::{self, RecipeCollection};
use crate::db::services::{tag_service, user_service};

pub const MAX_NAME_LENGTH: usize = 200;
pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 360;
pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Recipe with ID {0} not found")]
    NotFound(i32),
    #[error("Only the author may change this recipe.")]
    Forbidden,
    #[error("{0}")]
    Invalid(String),
    #[error("Ingredient with ID {0} does not exist.")]
    UnknownIngredient(i32),
    #[error("Tag with ID {0} does not exist.")]
    UnknownTag(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i32,
}

/// Everything an author supplies when creating or editing a recipe.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
}

impl RecipeDraft {
    pub fn validate(&self) -> Result<(), RecipeError> {
        let name_len = self.name.trim().chars().count();
        if name_len == 0 || name_len > MAX_NAME_LENGTH {
            return Err(RecipeError::Invalid(format!(
                "Recipe name must be between 1 and {MAX_NAME_LENGTH} characters."
            )));
        }
        if self.text.trim().is_empty() {
            return Err(RecipeError::Invalid("Recipe text is required.".to_string()));
        }
        if self.image.trim().is_empty() {
            return Err(RecipeError::Invalid("Recipe image is required.".to_string()));
        }
        if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&self.cooking_time) {
            return Err(RecipeError::Invalid(format!(
                "Cooking time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes."
            )));
        }

        if self.ingredients.is_empty() {
            return Err(RecipeError::Invalid(
                "A recipe needs at least one ingredient.".to_string(),
            ));
        }
        let mut seen_ingredients = HashSet::new();
        for item in &self.ingredients {
            if !seen_ingredients.insert(item.id) {
                return Err(RecipeError::Invalid(format!(
                    "Ingredient {} is listed more than once.",
                    item.id
                )));
            }
            if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&item.amount) {
                return Err(RecipeError::Invalid(format!(
                    "Ingredient amount must be between {MIN_AMOUNT} and {MAX_AMOUNT}."
                )));
            }
        }

        if self.tags.is_empty() {
            return Err(RecipeError::Invalid("A recipe needs at least one tag.".to_string()));
        }
        let mut seen_tags = HashSet::new();
        if let Some(dup) = self.tags.iter().find(|id| !seen_tags.insert(**id)) {
            return Err(RecipeError::Invalid(format!("Tag {dup} is listed more than once.")));
        }
        Ok(())
    }
}

/// Narrowing applied to the recipe feed.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author_id: Option<i32>,
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<i32>,
    pub in_cart_of: Option<i32>,
}

pub struct RecipeService;

impl RecipeService {
    pub async fn create_recipe(
        db: &DatabaseConnection,
        author_id: i32,
        draft: RecipeDraft,
    ) -> Result<recipe::Model, RecipeError> {
        draft.validate()?;

        let txn = db.begin().await?;
        ensure_references_exist(&txn, &draft).await?;

        let new_recipe = recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set(draft.name.trim().to_string()),
            image: Set(draft.image),
            text: Set(draft.text),
            cooking_time: Set(draft.cooking_time),
            pub_date: Set(Utc::now()),
            ..Default::default()
        };
        let recipe = new_recipe.insert(&txn).await?;
        insert_links(&txn, recipe.id, &draft.ingredients, &draft.tags).await?;
        txn.commit().await?;

        info!(recipe_id = recipe.id, author_id, "Recipe created.");
        Ok(recipe)
    }

    /// Replaces the recipe's fields and links. `pub_date` is kept.
    pub async fn update_recipe(
        db: &DatabaseConnection,
        recipe_id: i32,
        user_id: i32,
        draft: RecipeDraft,
    ) -> Result<recipe::Model, RecipeError> {
        let existing = Self::get_recipe(db, recipe_id).await?;
        if existing.author_id != user_id {
            return Err(RecipeError::Forbidden);
        }
        draft.validate()?;

        let txn = db.begin().await?;
        ensure_references_exist(&txn, &draft).await?;

        let mut active_recipe = existing.into_active_model();
        active_recipe.name = Set(draft.name.trim().to_string());
        active_recipe.image = Set(draft.image);
        active_recipe.text = Set(draft.text);
        active_recipe.cooking_time = Set(draft.cooking_time);
        let recipe = active_recipe.update(&txn).await?;

        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        insert_links(&txn, recipe_id, &draft.ingredients, &draft.tags).await?;
        txn.commit().await?;

        Ok(recipe)
    }

    /// Deletes a recipe; ingredient/tag links, favorites and cart entries go with it.
    pub async fn delete_recipe(
        db: &DatabaseConnection,
        recipe_id: i32,
        user_id: i32,
    ) -> Result<(), RecipeError> {
        let recipe = Self::get_recipe(db, recipe_id).await?;
        if recipe.author_id != user_id {
            return Err(RecipeError::Forbidden);
        }
        recipe.delete(db).await?;
        info!(recipe_id, user_id, "Recipe deleted.");
        Ok(())
    }

    pub async fn get_recipe<C: ConnectionTrait>(
        db: &C,
        recipe_id: i32,
    ) -> Result<recipe::Model, RecipeError> {
        Recipe::find_by_id(recipe_id)
            .one(db)
            .await?
            .ok_or(RecipeError::NotFound(recipe_id))
    }

    /// Newest first. `page` is 1-based.
    pub async fn list_recipes<C: ConnectionTrait>(
        db: &C,
        filter: &RecipeFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<recipe::Model>, u64), DbErr> {
        let mut query = Recipe::find();

        if let Some(author_id) = filter.author_id {
            query = query.filter(recipe::Column::AuthorId.eq(author_id));
        }
        if !filter.tag_slugs.is_empty() {
            let tag_ids: Vec<i32> = tag_service::find_tags_by_slugs(db, &filter.tag_slugs)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();
            query = query.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_tag::Column::RecipeId)
                        .from(recipe_tag::Entity)
                        .and_where(recipe_tag::Column::TagId.is_in(tag_ids))
                        .to_owned(),
                ),
            );
        }
        if let Some(user_id) = filter.favorited_by {
            query = query.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(favorite::Column::RecipeId)
                        .from(favorite::Entity)
                        .and_where(favorite::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            );
        }
        if let Some(user_id) = filter.in_cart_of {
            query = query.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(shopping_cart::Column::RecipeId)
                        .from(shopping_cart::Entity)
                        .and_where(shopping_cart::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            );
        }

        let paginator = query
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let recipes = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((recipes, total))
    }

    /// An author's newest recipes, at most `limit` of them when given.
    pub async fn recipes_by_author<C: ConnectionTrait>(
        db: &C,
        author_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<recipe::Model>, DbErr> {
        let mut query = Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id);
        if let Some(limit) = limit {
            // The driver binds LIMIT as a signed 64-bit value.
            query = query.limit(limit.min(i64::MAX as u64));
        }
        query.all(db).await
    }

    pub async fn count_by_author<C: ConnectionTrait>(db: &C, author_id: i32) -> Result<u64, DbErr> {
        Recipe::find()
            .filter(recipe::Column::AuthorId.eq(author_id))
            .count(db)
            .await
    }

    pub async fn recipe_detail<C: ConnectionTrait>(
        db: &C,
        viewer_id: Option<i32>,
        recipe: recipe::Model,
    ) -> Result<RecipeDetail, DbErr> {
        let mut details = Self::recipe_details(db, viewer_id, vec![recipe]).await?;
        details
            .pop()
            .ok_or_else(|| DbErr::Custom("recipe detail was not assembled".to_string()))
    }

    /// Assembles full recipe views in a fixed number of queries, keeping the
    /// order of `recipes`.
    pub async fn recipe_details<C: ConnectionTrait>(
        db: &C,
        viewer_id: Option<i32>,
        recipes: Vec<recipe::Model>,
    ) -> Result<Vec<RecipeDetail>, DbErr> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }
        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

        let mut tags_by_recipe: HashMap<i32, Vec<tag::Model>> = HashMap::new();
        let tag_links = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.clone()))
            .find_also_related(tag::Entity)
            .all(db)
            .await?;
        for (link, tag) in tag_links {
            if let Some(tag) = tag {
                tags_by_recipe.entry(link.recipe_id).or_default().push(tag);
            }
        }
        for tags in tags_by_recipe.values_mut() {
            tags.sort_by_key(|t| t.id);
        }

        let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredientAmount>> = HashMap::new();
        let ingredient_links = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.clone()))
            .order_by_asc(recipe_ingredient::Column::Id)
            .find_also_related(ingredient::Entity)
            .all(db)
            .await?;
        for (link, ingredient) in ingredient_links {
            if let Some(ingredient) = ingredient {
                ingredients_by_recipe
                    .entry(link.recipe_id)
                    .or_default()
                    .push(RecipeIngredientAmount {
                        id: ingredient.id,
                        name: ingredient.name,
                        measurement_unit: ingredient.measurement_unit,
                        amount: link.amount,
                    });
            }
        }

        let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let authors = user::Entity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(db)
            .await?;
        let authors: HashMap<i32, UserProfile> = user_service::profiles(db, viewer_id, &authors)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let (favorited, in_cart) = match viewer_id {
            Some(viewer_id) => {
                let favorited = collection_service::recipe_ids_in(
                    db,
                    RecipeCollection::Favorites,
                    viewer_id,
                    &recipe_ids,
                )
                .await?;
                let in_cart = collection_service::recipe_ids_in(
                    db,
                    RecipeCollection::ShoppingCart,
                    viewer_id,
                    &recipe_ids,
                )
                .await?;
                (favorited, in_cart)
            }
            None => (HashSet::new(), HashSet::new()),
        };

        recipes
            .into_iter()
            .map(|recipe| {
                let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                    DbErr::RecordNotFound(format!(
                        "author {} of recipe {}",
                        recipe.author_id, recipe.id
                    ))
                })?;
                Ok(RecipeDetail {
                    id: recipe.id,
                    tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                    author,
                    ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                    name: recipe.name,
                    image: recipe.image,
                    text: recipe.text,
                    cooking_time: recipe.cooking_time,
                    pub_date: recipe.pub_date,
                })
            })
            .collect()
    }
}

async fn ensure_references_exist<C: ConnectionTrait>(
    db: &C,
    draft: &RecipeDraft,
) -> Result<(), RecipeError> {
    let ingredient_ids: Vec<i32> = draft.ingredients.iter().map(|i| i.id).collect();
    let known_ingredients: HashSet<i32> = ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Id)
        .filter(ingredient::Column::Id.is_in(ingredient_ids.clone()))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    if let Some(missing) = ingredient_ids.iter().find(|id| !known_ingredients.contains(id)) {
        return Err(RecipeError::UnknownIngredient(*missing));
    }

    let known_tags: HashSet<i32> = tag::Entity::find()
        .select_only()
        .column(tag::Column::Id)
        .filter(tag::Column::Id.is_in(draft.tags.clone()))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    if let Some(missing) = draft.tags.iter().find(|id| !known_tags.contains(id)) {
        return Err(RecipeError::UnknownTag(*missing));
    }
    Ok(())
}

async fn insert_links<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    ingredients: &[IngredientAmount],
    tag_ids: &[i32],
) -> Result<(), DbErr> {
    let ingredient_rows = ingredients.iter().map(|item| recipe_ingredient::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(item.id),
        amount: Set(item.amount),
        ..Default::default()
    });
    recipe_ingredient::Entity::insert_many(ingredient_rows)
        .exec(db)
        .await?;

    let tag_rows = tag_ids.iter().map(|tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(*tag_id),
        ..Default::default()
    });
    recipe_tag::Entity::insert_many(tag_rows).exec(db).await?;
    Ok(())
}
