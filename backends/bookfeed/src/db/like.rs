use sqlx::{PgExecutor, PgPool};

use crate::error::AppResult;

use super::{PostId, UserId};

/// Returns `false` when the user already liked the post.
pub async fn create_like<'e, E>(db: E, user_id: UserId, post_id: PostId) -> AppResult<bool>
where
    E: PgExecutor<'e>,
{
    let inserted = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO likes (user_id, post_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, post_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_optional(db)
    .await?;

    Ok(inserted.is_some())
}

pub async fn delete_like(pool: &PgPool, user_id: UserId, post_id: PostId) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}
