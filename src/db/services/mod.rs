//! Data access for the Foodgram domain.
//!
//! Each sub-module owns one area (users, catalogs, recipes, relationships)
//! and defines its own error enum. The main entry points are re-exported here
//! so callers can reach them under `crate::db::services::`.

pub mod collection_service;
pub mod follow_service;
pub mod ingredient_service;
pub mod recipe_service;
pub mod shopping_list_service;
pub mod tag_service;
pub mod user_service;

pub use collection_service::{CollectionError, RecipeCollection};
pub use follow_service::{FollowError, FollowService};
pub use ingredient_service::IngredientError;
pub use recipe_service::{IngredientAmount, RecipeDraft, RecipeError, RecipeFilter, RecipeService};
pub use tag_service::TagError;
pub use user_service::{NewUser, UserError};
