use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::AppResult;

use super::{BookId, UserId};

#[derive(Debug, Serialize, FromRow)]
pub struct Summary {
    pub id: i32,
    pub book_id: BookId,
    pub book_title: String,
    pub book_author: String,
    pub summary_text: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create_summary(
    pool: &PgPool,
    user_id: UserId,
    book_id: BookId,
    summary_text: &str,
) -> AppResult<Summary> {
    let summary = sqlx::query_as::<_, Summary>(
        r#"
        WITH summary AS (
            INSERT INTO summaries (user_id, book_id, summary_text)
            VALUES ($1, $2, $3)
            RETURNING *
        )
        SELECT
            summary.id,
            summary.book_id,
            books.title AS book_title,
            books.author AS book_author,
            summary.summary_text,
            summary.created_at
        FROM summary INNER JOIN books ON books.id = summary.book_id
        "#,
    )
    .bind(user_id)
    .bind(book_id)
    .bind(summary_text)
    .fetch_one(pool)
    .await?;

    Ok(summary)
}

pub async fn list_user_summaries(pool: &PgPool, user_id: UserId) -> AppResult<Vec<Summary>> {
    let summaries = sqlx::query_as::<_, Summary>(
        r#"
        SELECT
            summaries.id,
            summaries.book_id,
            books.title AS book_title,
            books.author AS book_author,
            summaries.summary_text,
            summaries.created_at
        FROM summaries
        INNER JOIN books ON books.id = summaries.book_id
        WHERE summaries.user_id = $1
        ORDER BY summaries.created_at DESC, summaries.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(summaries)
}
