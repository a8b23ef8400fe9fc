use sqlx::{PgExecutor, PgPool};

use crate::error::AppResult;

use super::{UserId, UserSummary};

/// Inserts the follow edge; returns `false` when it already existed.
pub async fn create_follow<'e, E>(db: E, follower_id: UserId, followee_id: UserId) -> AppResult<bool>
where
    E: PgExecutor<'e>,
{
    let inserted = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO follows (follower_id, followee_id)
        VALUES ($1, $2)
        ON CONFLICT (follower_id, followee_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(follower_id)
    .bind(followee_id)
    .fetch_optional(db)
    .await?;

    Ok(inserted.is_some())
}

/// Removes the follow edge; returns `false` when there was none.
pub async fn delete_follow(pool: &PgPool, follower_id: UserId, followee_id: UserId) -> AppResult<bool> {
    let affected = sqlx::query(
        r#"
        DELETE FROM follows
        WHERE follower_id = $1 AND followee_id = $2
        "#,
    )
    .bind(follower_id)
    .bind(followee_id)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

pub async fn list_followers(pool: &PgPool, user_id: UserId) -> AppResult<Vec<UserSummary>> {
    let followers = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT users.id, users.username
        FROM follows
        INNER JOIN users ON users.id = follows.follower_id
        WHERE follows.followee_id = $1
        ORDER BY follows.followed_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(followers)
}

pub async fn list_following(pool: &PgPool, user_id: UserId) -> AppResult<Vec<UserSummary>> {
    let following = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT users.id, users.username
        FROM follows
        INNER JOIN users ON users.id = follows.followee_id
        WHERE follows.follower_id = $1
        ORDER BY follows.followed_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(following)
}
