use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::AppResult;

use super::{BookId, UserId};

pub type BookmarkId = i32;

#[derive(Debug, Serialize, FromRow)]
pub struct Bookmark {
    pub id: BookmarkId,
    pub book_id: BookId,
    pub book_title: String,
    pub book_author: String,
    pub book_description: Option<String>,
    pub book_file_url: Option<String>,
    pub book_cover_image_url: Option<String>,
    pub status: Option<String>,
    pub personal_note: Option<String>,
    pub added_at: DateTime<Utc>,
}

pub async fn list_bookmarks(pool: &PgPool, user_id: UserId) -> AppResult<Vec<Bookmark>> {
    let bookmarks = sqlx::query_as::<_, Bookmark>(
        r#"
        SELECT
            user_books.id,
            books.id AS book_id,
            books.title AS book_title,
            books.author AS book_author,
            books.description AS book_description,
            books.file_url AS book_file_url,
            books.cover_image_url AS book_cover_image_url,
            user_books.status,
            user_books.personal_note,
            user_books.added_at
        FROM user_books
        INNER JOIN books ON books.id = user_books.book_id
        WHERE user_books.user_id = $1
        ORDER BY user_books.added_at DESC, user_books.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(bookmarks)
}

/// Returns the new bookmark id, or `None` when the book is already bookmarked.
pub async fn create_bookmark(
    pool: &PgPool,
    user_id: UserId,
    book_id: BookId,
    status: Option<&str>,
    personal_note: Option<&str>,
) -> AppResult<Option<BookmarkId>> {
    let id = sqlx::query_scalar::<_, BookmarkId>(
        r#"
        INSERT INTO user_books (user_id, book_id, status, personal_note)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, book_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(book_id)
    .bind(status)
    .bind(personal_note)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

pub async fn update_bookmark(
    pool: &PgPool,
    bookmark_id: BookmarkId,
    user_id: UserId,
    status: Option<&str>,
    personal_note: Option<&str>,
) -> AppResult<bool> {
    let affected = sqlx::query(
        r#"
        UPDATE user_books
            SET (status, personal_note) = (COALESCE($1, status), COALESCE($2, personal_note))
            WHERE id = $3 AND user_id = $4
        "#,
    )
    .bind(status)
    .bind(personal_note)
    .bind(bookmark_id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

pub async fn delete_bookmark(pool: &PgPool, bookmark_id: BookmarkId, user_id: UserId) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM user_books WHERE id = $1 AND user_id = $2")
        .bind(bookmark_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}

pub async fn clear_bookmarks(pool: &PgPool, user_id: UserId) -> AppResult<u64> {
    let affected = sqlx::query("DELETE FROM user_books WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected)
}
