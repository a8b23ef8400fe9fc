use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};

use crate::error::{AppError, AppResult};

use super::UserId;

pub type BookId = i32;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub cover_image_url: Option<String>,
    pub file_url: Option<String>,
    pub year_published: Option<i32>,
    pub isbn: Option<String>,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Catalog fields supplied by a client or by the recommender.
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub cover_image_url: Option<String>,
    pub file_url: Option<String>,
    pub year_published: Option<i32>,
    pub isbn: Option<String>,
}

pub(super) const SELECT_BOOK: &str = r#"
    SELECT
        books.id,
        books.title,
        books.author,
        books.description,
        genres.name AS genre,
        books.cover_image_url,
        books.file_url,
        books.year_published,
        books.isbn,
        books.user_id,
        books.created_at,
        books.updated_at
    FROM books
    LEFT JOIN genres ON genres.id = books.genre_id
"#;

pub async fn list_books(pool: &PgPool, limit: i64, offset: i64) -> AppResult<(Vec<Book>, i64)> {
    let books = sqlx::query_as::<_, Book>(&format!(
        "{SELECT_BOOK} ORDER BY books.id LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books")
        .fetch_one(pool)
        .await?;

    Ok((books, total))
}

pub async fn get_book(pool: &PgPool, book_id: BookId) -> AppResult<Book> {
    let book = sqlx::query_as::<_, Book>(&format!("{SELECT_BOOK} WHERE books.id = $1"))
        .bind(book_id)
        .fetch_optional(pool)
        .await?;

    book.ok_or(AppError::not_found("Book not found."))
}

pub async fn book_exists<'e, E>(db: E, book_id: BookId) -> AppResult<bool>
where
    E: PgExecutor<'e>,
{
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM books WHERE id = $1)")
        .bind(book_id)
        .fetch_one(db)
        .await?;

    Ok(exists)
}

pub async fn search_books(
    pool: &PgPool,
    title: Option<&str>,
    author: Option<&str>,
) -> AppResult<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(&format!(
        r#"{SELECT_BOOK}
        WHERE ($1::TEXT IS NULL OR books.title ILIKE '%' || $1 || '%')
            AND ($2::TEXT IS NULL OR books.author ILIKE '%' || $2 || '%')
        ORDER BY books.title
        "#
    ))
    .bind(title)
    .bind(author)
    .fetch_all(pool)
    .await?;

    Ok(books)
}

/// Inserts a catalog entry, creating its genre on first use.
pub async fn create_book<'e, E>(db: E, owner: UserId, book: &NewBook) -> AppResult<BookId>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, BookId>(
        r#"
        WITH genre AS (
            INSERT INTO genres (name)
            SELECT $4::TEXT WHERE $4::TEXT IS NOT NULL
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
        )
        INSERT INTO books
            (title, author, description, genre_id, cover_image_url, file_url, year_published, isbn, user_id)
        VALUES ($1, $2, $3, (SELECT id FROM genre), $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.description)
    .bind(&book.genre)
    .bind(&book.cover_image_url)
    .bind(&book.file_url)
    .bind(book.year_published)
    .bind(&book.isbn)
    .bind(owner)
    .fetch_one(db)
    .await?;

    Ok(id)
}

/// Overwrites the owner's book; `false` when no book with that id belongs to `owner`.
pub async fn update_book(pool: &PgPool, book_id: BookId, owner: UserId, book: &NewBook) -> AppResult<bool> {
    let affected = sqlx::query(
        r#"
        WITH genre AS (
            INSERT INTO genres (name)
            SELECT $4::TEXT WHERE $4::TEXT IS NOT NULL
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
        )
        UPDATE books
            SET (title, author, description, genre_id, cover_image_url, file_url, year_published, isbn, updated_at) =
                ($1, $2, $3, (SELECT id FROM genre), $5, $6, $7, $8, NOW())
            WHERE id = $9 AND user_id = $10
        "#,
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.description)
    .bind(&book.genre)
    .bind(&book.cover_image_url)
    .bind(&book.file_url)
    .bind(book.year_published)
    .bind(&book.isbn)
    .bind(book_id)
    .bind(owner)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

pub async fn delete_book(pool: &PgPool, book_id: BookId, owner: UserId) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM books WHERE id = $1 AND user_id = $2")
        .bind(book_id)
        .bind(owner)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}

pub async fn list_genres(pool: &PgPool) -> AppResult<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(genres)
}
