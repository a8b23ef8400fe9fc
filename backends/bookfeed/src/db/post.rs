use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};

use crate::error::{AppError, AppResult};

use super::{BookId, UserId};

pub type PostId = i32;

#[derive(Debug, Serialize, FromRow)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub author: String,
    pub book_id: Option<BookId>,
    pub book_title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub moods: Vec<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub posted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

const SELECT_POST: &str = r#"
    SELECT
        posts.id,
        posts.user_id,
        users.username AS author,
        posts.book_id,
        books.title AS book_title,
        posts.content,
        posts.image_url,
        ARRAY(
            SELECT moods.name
            FROM post_moods
            INNER JOIN moods ON moods.id = post_moods.mood_id
            WHERE post_moods.post_id = posts.id
            ORDER BY moods.name
        ) AS moods,
        (SELECT COUNT(*) FROM likes WHERE likes.post_id = posts.id) AS like_count,
        (SELECT COUNT(*) FROM comments WHERE comments.post_id = posts.id) AS comment_count,
        posts.posted_at,
        posts.updated_at
    FROM posts
    INNER JOIN users ON users.id = posts.user_id
    LEFT JOIN books ON books.id = posts.book_id
"#;

pub async fn list_posts(pool: &PgPool, limit: i64, offset: i64) -> AppResult<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "{SELECT_POST} ORDER BY posts.posted_at DESC, posts.id DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

pub async fn list_user_posts(pool: &PgPool, user_id: UserId) -> AppResult<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "{SELECT_POST} WHERE posts.user_id = $1 ORDER BY posts.posted_at DESC, posts.id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

pub async fn get_post(pool: &PgPool, post_id: PostId) -> AppResult<Post> {
    let post = sqlx::query_as::<_, Post>(&format!("{SELECT_POST} WHERE posts.id = $1"))
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

    post.ok_or(AppError::not_found("Post not found."))
}

/// Author of the post, or `None` when the post does not exist.
pub async fn post_author<'e, E>(db: E, post_id: PostId) -> AppResult<Option<UserId>>
where
    E: PgExecutor<'e>,
{
    let author = sqlx::query_scalar::<_, UserId>("SELECT user_id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(db)
        .await?;

    Ok(author)
}

pub async fn create_post<'e, E>(
    db: E,
    author: UserId,
    book_id: Option<BookId>,
    content: &str,
    image_url: Option<&str>,
) -> AppResult<PostId>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, PostId>(
        r#"
        INSERT INTO posts (user_id, book_id, content, image_url)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(author)
    .bind(book_id)
    .bind(content)
    .bind(image_url)
    .fetch_one(db)
    .await?;

    Ok(id)
}

pub async fn update_post(
    pool: &PgPool,
    post_id: PostId,
    author: UserId,
    content: Option<&str>,
    image_url: Option<&str>,
) -> AppResult<bool> {
    let affected = sqlx::query(
        r#"
        UPDATE posts
            SET (content, image_url, updated_at) =
                (COALESCE($1, content), COALESCE($2, image_url), NOW())
            WHERE id = $3 AND user_id = $4
        "#,
    )
    .bind(content)
    .bind(image_url)
    .bind(post_id)
    .bind(author)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

pub async fn delete_post(pool: &PgPool, post_id: PostId, author: UserId) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM posts WHERE id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(author)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}
