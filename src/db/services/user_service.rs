use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::db::constraint;
use crate::db::entities::{follow, prelude::User, user};
use crate::db::models::UserProfile;

pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_NAME_LENGTH: usize = 150;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("User with ID {0} not found")]
    NotFound(i32),
    #[error("A user with this email already exists.")]
    DuplicateEmail,
    #[error("A user with this username already exists.")]
    DuplicateUsername,
    #[error("{0}")]
    Invalid(String),
}

/// Registration data with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), UserError> {
        if self.email.is_empty() || !self.email.contains('@') {
            return Err(UserError::Invalid("Enter a valid email address.".to_string()));
        }
        if self.email.chars().count() > MAX_EMAIL_LENGTH {
            return Err(UserError::Invalid(format!(
                "Email must be at most {MAX_EMAIL_LENGTH} characters."
            )));
        }
        let username_ok = !self.username.is_empty()
            && self
                .username
                .chars()
                .all(|c| c.is_alphanumeric() || "@.+-_".contains(c));
        if !username_ok {
            return Err(UserError::Invalid(
                "Username may contain only letters, digits and @/./+/-/_ characters.".to_string(),
            ));
        }
        for (field, value) in [
            ("username", &self.username),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if value.chars().count() > MAX_NAME_LENGTH {
                return Err(UserError::Invalid(format!(
                    "Field '{field}' must be at most {MAX_NAME_LENGTH} characters."
                )));
            }
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(UserError::Invalid(
                "First and last name are required.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Creates a user. Email and username must both be unused.
pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    new_user: NewUser,
) -> Result<user::Model, UserError> {
    new_user.validate()?;

    if get_user_by_email(db, &new_user.email).await?.is_some() {
        return Err(UserError::DuplicateEmail);
    }
    if User::find()
        .filter(user::Column::Username.eq(&new_user.username))
        .one(db)
        .await?
        .is_some()
    {
        return Err(UserError::DuplicateUsername);
    }

    let active_user = user::ActiveModel {
        email: Set(new_user.email),
        username: Set(new_user.username),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        password_hash: Set(new_user.password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    active_user.insert(db).await.map_err(|e| {
        // A concurrent registration won the race on one of the unique columns.
        if constraint::is_unique_violation(&e) {
            UserError::DuplicateEmail
        } else {
            UserError::DbErr(e)
        }
    })
}

pub async fn get_user_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

pub async fn get_user_by_id<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<user::Model, UserError> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(UserError::NotFound(user_id))
}

/// Lists users ordered by id. `page` is 1-based.
pub async fn list_users<C: ConnectionTrait>(
    db: &C,
    page: u64,
    limit: u64,
) -> Result<(Vec<user::Model>, u64), DbErr> {
    let paginator = User::find().order_by_asc(user::Column::Id).paginate(db, limit);
    let total = paginator.num_items().await?;
    let users = paginator.fetch_page(page.saturating_sub(1)).await?;
    Ok((users, total))
}

/// Returns the subset of `author_ids` that `follower_id` is subscribed to.
pub async fn followed_among<C: ConnectionTrait>(
    db: &C,
    follower_id: i32,
    author_ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<i32> = follow::Entity::find()
        .select_only()
        .column(follow::Column::AuthorId)
        .filter(follow::Column::UserId.eq(follower_id))
        .filter(follow::Column::AuthorId.is_in(author_ids.to_vec()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Builds profiles for `users` as seen by `viewer_id`.
pub async fn profiles<C: ConnectionTrait>(
    db: &C,
    viewer_id: Option<i32>,
    users: &[user::Model],
) -> Result<Vec<UserProfile>, DbErr> {
    let followed = match viewer_id {
        Some(viewer_id) => {
            let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
            followed_among(db, viewer_id, &ids).await?
        }
        None => HashSet::new(),
    };
    Ok(users
        .iter()
        .map(|u| UserProfile::from_user(u, followed.contains(&u.id)))
        .collect())
}
