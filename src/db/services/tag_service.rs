use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::constraint;
use crate::db::entities::{prelude::Tag, tag};

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_SLUG_LENGTH: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Tag with ID {0} not found")]
    NotFound(i32),
    #[error("{0}")]
    Invalid(String),
    #[error("A tag with the slug '{0}' already exists.")]
    DuplicateSlug(String),
}

pub async fn list_tags<C: ConnectionTrait>(db: &C) -> Result<Vec<tag::Model>, DbErr> {
    Tag::find().order_by_asc(tag::Column::Id).all(db).await
}

pub async fn get_tag<C: ConnectionTrait>(db: &C, tag_id: i32) -> Result<tag::Model, TagError> {
    Tag::find_by_id(tag_id)
        .one(db)
        .await?
        .ok_or(TagError::NotFound(tag_id))
}

/// Fetches the tags with the given slugs; unknown slugs are skipped.
pub async fn find_tags_by_slugs<C: ConnectionTrait>(
    db: &C,
    slugs: &[String],
) -> Result<Vec<tag::Model>, DbErr> {
    if slugs.is_empty() {
        return Ok(Vec::new());
    }
    Tag::find()
        .filter(tag::Column::Slug.is_in(slugs.to_vec()))
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await
}

pub async fn create_tag<C: ConnectionTrait>(
    db: &C,
    name: String,
    color: String,
    slug: String,
) -> Result<tag::Model, TagError> {
    let name = name.trim().to_string();
    let color = color.trim().to_uppercase();
    let slug = slug.trim().to_string();
    validate(&name, &color, &slug)?;

    if Tag::find()
        .filter(tag::Column::Slug.eq(&slug))
        .one(db)
        .await?
        .is_some()
    {
        return Err(TagError::DuplicateSlug(slug));
    }

    let active_tag = tag::ActiveModel {
        name: Set(name),
        color: Set(color),
        slug: Set(slug.clone()),
        ..Default::default()
    };
    active_tag.insert(db).await.map_err(|e| {
        if constraint::is_unique_violation(&e) {
            TagError::DuplicateSlug(slug)
        } else {
            TagError::DbErr(e)
        }
    })
}

/// Deletes a tag. The ON DELETE CASCADE on recipe_tags drops its recipe links.
pub async fn delete_tag<C: ConnectionTrait>(db: &C, tag_id: i32) -> Result<(), TagError> {
    let tag = get_tag(db, tag_id).await?;
    tag.delete(db).await?;
    Ok(())
}

fn validate(name: &str, color: &str, slug: &str) -> Result<(), TagError> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(TagError::Invalid(format!(
            "Tag name must be between 1 and {MAX_NAME_LENGTH} characters."
        )));
    }
    if !is_hex_color(color) {
        return Err(TagError::Invalid(
            "Tag color must be a hex color such as #E26C2D.".to_string(),
        ));
    }
    let slug_ok = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !slug_ok {
        return Err(TagError::Invalid(format!(
            "Tag slug must be 1 to {MAX_SLUG_LENGTH} letters, digits, hyphens or underscores."
        )));
    }
    Ok(())
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}
