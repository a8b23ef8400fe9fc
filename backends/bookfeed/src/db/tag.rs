use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};

use crate::error::AppResult;

use super::BookId;

pub type TagId = i32;

#[derive(Debug, Serialize, FromRow)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

pub async fn list_tags(pool: &PgPool) -> AppResult<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(tags)
}

/// Returns `None` when a tag with that name already exists.
pub async fn create_tag(pool: &PgPool, name: &str) -> AppResult<Option<Tag>> {
    let tag = sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (name)
        VALUES ($1)
        ON CONFLICT (name) DO NOTHING
        RETURNING id, name
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(tag)
}

pub async fn delete_tag(pool: &PgPool, tag_id: TagId) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(tag_id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}

/// Finds or creates the tag by name.
pub async fn ensure_tag<'e, E>(db: E, name: &str) -> AppResult<Tag>
where
    E: PgExecutor<'e>,
{
    let tag = sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (name)
        VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id, name
        "#,
    )
    .bind(name)
    .fetch_one(db)
    .await?;

    Ok(tag)
}

/// Returns `false` when the tag was already attached to the book.
pub async fn attach_book_tag<'e, E>(db: E, book_id: BookId, tag_id: TagId) -> AppResult<bool>
where
    E: PgExecutor<'e>,
{
    let inserted = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO book_tags (book_id, tag_id)
        VALUES ($1, $2)
        ON CONFLICT (book_id, tag_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(book_id)
    .bind(tag_id)
    .fetch_optional(db)
    .await?;

    Ok(inserted.is_some())
}

pub async fn list_book_tags(pool: &PgPool, book_id: BookId) -> AppResult<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT tags.id, tags.name
        FROM tags
        INNER JOIN book_tags ON book_tags.tag_id = tags.id
        WHERE book_tags.book_id = $1
        ORDER BY tags.name
        "#,
    )
    .bind(book_id)
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

pub async fn detach_book_tag(pool: &PgPool, book_id: BookId, tag_id: TagId) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM book_tags WHERE book_id = $1 AND tag_id = $2")
        .bind(book_id)
        .bind(tag_id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}
