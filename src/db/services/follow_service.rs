use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, warn};

use crate::db::constraint::{self, ConstraintViolation};
use crate::db::entities::{follow, prelude::User, user};
use crate::db::models::{AuthorSummary, RecipeShort};
use crate::db::services::recipe_service::RecipeService;
use crate::db::services::user_service;

#[derive(Debug, thiserror::Error)]
pub enum FollowError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("User with ID {0} not found")]
    AuthorNotFound(i32),
    #[error("You cannot subscribe to yourself.")]
    SelfFollow,
    #[error("You are already subscribed to this user.")]
    AlreadySubscribed,
    #[error("You are not subscribed to this user.")]
    NotSubscribed,
}

pub struct FollowService;

impl FollowService {
    /// Subscribes `user_id` to `author_id` and returns the author as the
    /// subscriber now sees them.
    pub async fn subscribe<C: ConnectionTrait>(
        db: &C,
        user_id: i32,
        author_id: i32,
        recipes_limit: Option<u64>,
    ) -> Result<AuthorSummary, FollowError> {
        let author = find_author(db, author_id).await?;
        if user_id == author_id {
            return Err(FollowError::SelfFollow);
        }
        if find_follow(db, user_id, author_id).await?.is_some() {
            return Err(FollowError::AlreadySubscribed);
        }

        let new_follow = follow::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            ..Default::default()
        };
        new_follow
            .insert(db)
            .await
            .map_err(|e| match constraint::violation(&e) {
                Some(ConstraintViolation::Unique) => {
                    warn!(user_id, author_id, "Duplicate subscription rejected by the store.");
                    FollowError::AlreadySubscribed
                }
                Some(ConstraintViolation::Check) => FollowError::SelfFollow,
                _ => FollowError::DbErr(e),
            })?;
        info!(user_id, author_id, "User subscribed.");

        let mut summaries =
            Self::author_summaries(db, Some(user_id), &[author], recipes_limit).await?;
        summaries.pop().ok_or_else(|| {
            FollowError::DbErr(DbErr::Custom("author summary missing".to_string()))
        })
    }

    pub async fn unsubscribe<C: ConnectionTrait>(
        db: &C,
        user_id: i32,
        author_id: i32,
    ) -> Result<(), FollowError> {
        find_author(db, author_id).await?;
        let existing = find_follow(db, user_id, author_id)
            .await?
            .ok_or(FollowError::NotSubscribed)?;
        existing.delete(db).await?;
        info!(user_id, author_id, "User unsubscribed.");
        Ok(())
    }

    /// Authors followed by `user_id`, ordered by id. `page` is 1-based.
    pub async fn list_subscriptions<C: ConnectionTrait>(
        db: &C,
        user_id: i32,
        page: u64,
        limit: u64,
        recipes_limit: Option<u64>,
    ) -> Result<(Vec<AuthorSummary>, u64), DbErr> {
        let paginator = User::find()
            .filter(
                user::Column::Id.in_subquery(
                    Query::select()
                        .column(follow::Column::AuthorId)
                        .from(follow::Entity)
                        .and_where(follow::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            )
            .order_by_asc(user::Column::Id)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let authors = paginator.fetch_page(page.saturating_sub(1)).await?;
        let summaries = Self::author_summaries(db, Some(user_id), &authors, recipes_limit).await?;
        Ok((summaries, total))
    }

    /// Profiles of `authors` with their newest recipes (at most
    /// `recipes_limit`) and total recipe count.
    pub async fn author_summaries<C: ConnectionTrait>(
        db: &C,
        viewer_id: Option<i32>,
        authors: &[user::Model],
        recipes_limit: Option<u64>,
    ) -> Result<Vec<AuthorSummary>, DbErr> {
        let profiles = user_service::profiles(db, viewer_id, authors).await?;
        let mut summaries = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let recipes = RecipeService::recipes_by_author(db, profile.id, recipes_limit).await?;
            let recipes_count = RecipeService::count_by_author(db, profile.id).await?;
            summaries.push(AuthorSummary {
                profile,
                recipes: recipes.iter().map(RecipeShort::from).collect(),
                recipes_count,
            });
        }
        Ok(summaries)
    }
}

async fn find_author<C: ConnectionTrait>(db: &C, author_id: i32) -> Result<user::Model, FollowError> {
    User::find_by_id(author_id)
        .one(db)
        .await?
        .ok_or(FollowError::AuthorNotFound(author_id))
}

async fn find_follow<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<Option<follow::Model>, DbErr> {
    follow::Entity::find()
        .filter(follow::Column::UserId.eq(user_id))
        .filter(follow::Column::AuthorId.eq(author_id))
        .one(db)
        .await
}
