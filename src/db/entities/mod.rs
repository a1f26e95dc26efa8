//! SeaORM entities for every table the migrations create.

pub mod favorite;
pub mod follow;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod shopping_cart;
pub mod tag;
pub mod user;

pub mod prelude {
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;

    pub use super::ingredient::Entity as Ingredient;
    pub use super::ingredient::Model as IngredientModel;
    pub use super::ingredient::ActiveModel as IngredientActiveModel;
    pub use super::ingredient::Column as IngredientColumn;

    pub use super::tag::Entity as Tag;
    pub use super::tag::Model as TagModel;
    pub use super::tag::ActiveModel as TagActiveModel;
    pub use super::tag::Column as TagColumn;

    pub use super::recipe::Entity as Recipe;
    pub use super::recipe::Model as RecipeModel;
    pub use super::recipe::ActiveModel as RecipeActiveModel;
    pub use super::recipe::Column as RecipeColumn;

    pub use super::recipe_ingredient::Entity as RecipeIngredient;
    pub use super::recipe_ingredient::Model as RecipeIngredientModel;
    pub use super::recipe_ingredient::ActiveModel as RecipeIngredientActiveModel;
    pub use super::recipe_ingredient::Column as RecipeIngredientColumn;

    pub use super::recipe_tag::Entity as RecipeTag;
    pub use super::recipe_tag::Model as RecipeTagModel;
    pub use super::recipe_tag::ActiveModel as RecipeTagActiveModel;
    pub use super::recipe_tag::Column as RecipeTagColumn;

    pub use super::favorite::Entity as Favorite;
    pub use super::favorite::Model as FavoriteModel;
    pub use super::favorite::ActiveModel as FavoriteActiveModel;
    pub use super::favorite::Column as FavoriteColumn;

    pub use super::shopping_cart::Entity as ShoppingCart;
    pub use super::shopping_cart::Model as ShoppingCartModel;
    pub use super::shopping_cart::ActiveModel as ShoppingCartActiveModel;
    pub use super::shopping_cart::Column as ShoppingCartColumn;

    pub use super::follow::Entity as Follow;
    pub use super::follow::Model as FollowModel;
    pub use super::follow::ActiveModel as FollowActiveModel;
    pub use super::follow::Column as FollowColumn;
}
