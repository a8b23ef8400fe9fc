use sqlx::PgPool;

use crate::{error::AppResult, feed::FeedCandidate};

use super::UserId;

/// Posts matching at least one relevance signal for `viewer`, with their
/// like and comment counts. Counts come from correlated sub-selects so the
/// two aggregates never multiply each other.
pub async fn feed_candidates(pool: &PgPool, viewer: UserId) -> AppResult<Vec<FeedCandidate>> {
    let candidates = sqlx::query_as::<_, FeedCandidate>(
        r#"
        WITH followed AS (
            SELECT followee_id FROM follows WHERE follower_id = $1
        ),
        active_moods AS (
            SELECT mood_id FROM user_moods WHERE user_id = $1
        ),
        recommended_books AS (
            SELECT book_id FROM user_recommendations WHERE user_id = $1
        ),
        candidates AS (
            SELECT posts.id FROM posts
            WHERE posts.user_id IN (SELECT followee_id FROM followed)
            UNION
            SELECT post_moods.post_id FROM post_moods
            WHERE post_moods.mood_id IN (SELECT mood_id FROM active_moods)
            UNION
            SELECT posts.id FROM posts
            WHERE posts.book_id IN (SELECT book_id FROM recommended_books)
        )
        SELECT
            posts.id,
            posts.user_id AS author_id,
            users.username AS author,
            posts.book_id,
            books.title AS book_title,
            posts.content,
            posts.image_url,
            posts.posted_at,
            (SELECT COUNT(*) FROM likes WHERE likes.post_id = posts.id) AS like_count,
            (SELECT COUNT(*) FROM comments WHERE comments.post_id = posts.id) AS comment_count
        FROM candidates
        INNER JOIN posts ON posts.id = candidates.id
        INNER JOIN users ON users.id = posts.user_id
        LEFT JOIN books ON books.id = posts.book_id
        "#,
    )
    .bind(viewer)
    .fetch_all(pool)
    .await?;

    Ok(candidates)
}
