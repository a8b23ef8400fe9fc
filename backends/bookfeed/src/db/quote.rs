use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::AppResult;

use super::{BookId, UserId};

pub type QuoteId = i32;

#[derive(Debug, Serialize, FromRow)]
pub struct Quote {
    pub id: QuoteId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub book_title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

const SELECT_QUOTE: &str = r#"
    SELECT
        quotes.id,
        quotes.user_id,
        quotes.book_id,
        books.title AS book_title,
        quotes.content,
        quotes.created_at
    FROM quotes
    INNER JOIN books ON books.id = quotes.book_id
"#;

pub async fn list_user_quotes(
    pool: &PgPool,
    user_id: UserId,
    book_id: Option<BookId>,
) -> AppResult<Vec<Quote>> {
    let quotes = sqlx::query_as::<_, Quote>(&format!(
        r#"{SELECT_QUOTE}
        WHERE quotes.user_id = $1 AND ($2::INTEGER IS NULL OR quotes.book_id = $2)
        ORDER BY quotes.created_at DESC, quotes.id DESC
        "#
    ))
    .bind(user_id)
    .bind(book_id)
    .fetch_all(pool)
    .await?;

    Ok(quotes)
}

pub async fn get_quote(pool: &PgPool, quote_id: QuoteId) -> AppResult<Option<Quote>> {
    let quote = sqlx::query_as::<_, Quote>(&format!("{SELECT_QUOTE} WHERE quotes.id = $1"))
        .bind(quote_id)
        .fetch_optional(pool)
        .await?;

    Ok(quote)
}

pub async fn create_quote(
    pool: &PgPool,
    user_id: UserId,
    book_id: BookId,
    content: &str,
) -> AppResult<QuoteId> {
    let id = sqlx::query_scalar::<_, QuoteId>(
        "INSERT INTO quotes (user_id, book_id, content) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(book_id)
    .bind(content)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn delete_quote(pool: &PgPool, quote_id: QuoteId, user_id: UserId) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM quotes WHERE id = $1 AND user_id = $2")
        .bind(quote_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}
