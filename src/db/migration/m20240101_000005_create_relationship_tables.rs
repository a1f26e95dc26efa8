use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;
use super::m20240101_000004_create_recipes_tables::Recipes;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Favorites and shopping carts share one layout: a (user, recipe) pair that
/// is unique and dies with either side.
async fn create_user_recipe_table(
    manager: &SchemaManager<'_>,
    table: UserRecipeTable,
) -> Result<(), DbErr> {
    let name = table.name();
    manager
        .create_table(
            Table::create()
                .table(table)
                .if_not_exists()
                .col(
                    ColumnDef::new(UserRecipe::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(UserRecipe::UserId).integer().not_null())
                .col(ColumnDef::new(UserRecipe::RecipeId).integer().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk-{name}-user_id"))
                        .from(table, UserRecipe::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk-{name}-recipe_id"))
                        .from(table, UserRecipe::RecipeId)
                        .to(Recipes::Table, Recipes::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .name(format!("uq-{name}-user_id-recipe_id"))
                .table(table)
                .col(UserRecipe::UserId)
                .col(UserRecipe::RecipeId)
                .unique()
                .to_owned(),
        )
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_user_recipe_table(manager, UserRecipeTable::Favorites).await?;
        create_user_recipe_table(manager, UserRecipeTable::ShoppingCarts).await?;

        manager
            .create_table(
                Table::create()
                    .table(Follows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Follows::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Follows::UserId).integer().not_null())
                    .col(ColumnDef::new(Follows::AuthorId).integer().not_null())
                    .check(Expr::col(Follows::UserId).ne(Expr::col(Follows::AuthorId)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-follows-user_id")
                            .from(Follows::Table, Follows::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-follows-author_id")
                            .from(Follows::Table, Follows::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq-follows-user_id-author_id")
                    .table(Follows::Table)
                    .col(Follows::UserId)
                    .col(Follows::AuthorId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Follows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserRecipeTable::ShoppingCarts).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserRecipeTable::Favorites).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum UserRecipeTable {
    Favorites,
    ShoppingCarts,
}

impl UserRecipeTable {
    fn name(self) -> &'static str {
        match self {
            UserRecipeTable::Favorites => "favorites",
            UserRecipeTable::ShoppingCarts => "shopping_carts",
        }
    }
}

#[derive(DeriveIden)]
enum UserRecipe {
    Id,
    UserId,
    RecipeId,
}

#[derive(DeriveIden)]
enum Follows {
    Table,
    Id,
    UserId,
    AuthorId,
}
