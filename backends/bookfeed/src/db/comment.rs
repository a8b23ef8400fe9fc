use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};

use crate::error::AppResult;

use super::{PostId, UserId};

pub type CommentId = i32;

#[derive(Debug, Serialize, FromRow)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub username: String,
    pub content: String,
    pub posted_at: DateTime<Utc>,
}

pub async fn create_comment<'e, E>(
    db: E,
    post_id: PostId,
    user_id: UserId,
    content: &str,
) -> AppResult<Comment>
where
    E: PgExecutor<'e>,
{
    let comment = sqlx::query_as::<_, Comment>(
        r#"
        WITH comment AS (
            INSERT INTO comments (content, post_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING *
        )
        SELECT
            comment.id,
            comment.post_id,
            comment.user_id,
            users.username,
            comment.content,
            comment.posted_at
        FROM comment INNER JOIN users ON users.id = comment.user_id
        "#,
    )
    .bind(content)
    .bind(post_id)
    .bind(user_id)
    .fetch_one(db)
    .await?;

    Ok(comment)
}

pub async fn list_comments(pool: &PgPool, post_id: PostId) -> AppResult<Vec<Comment>> {
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT
            comments.id,
            comments.post_id,
            comments.user_id,
            users.username,
            comments.content,
            comments.posted_at
        FROM comments
        INNER JOIN users ON users.id = comments.user_id
        WHERE comments.post_id = $1
        ORDER BY comments.posted_at DESC, comments.id DESC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

pub async fn delete_comment(pool: &PgPool, comment_id: CommentId, user_id: UserId) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM comments WHERE id = $1 AND user_id = $2")
        .bind(comment_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}
