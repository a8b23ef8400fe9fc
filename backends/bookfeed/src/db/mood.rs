use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};

use crate::error::AppResult;

use super::{BookId, PostId, UserId};

pub type MoodId = i32;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Mood {
    pub id: MoodId,
    pub name: String,
}

/// Trims, lowercases and dedupes mood names, dropping blanks. Order is preserved.
pub fn normalize_mood_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref().trim().to_lowercase();
        if !name.is_empty() && !normalized.contains(&name) {
            normalized.push(name);
        }
    }
    normalized
}

pub async fn list_moods(pool: &PgPool) -> AppResult<Vec<Mood>> {
    let moods = sqlx::query_as::<_, Mood>("SELECT id, name FROM moods ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(moods)
}

/// Returns the moods with these (already normalized) names, creating missing ones.
pub async fn upsert_moods<'e, E>(db: E, names: &[String]) -> AppResult<Vec<Mood>>
where
    E: PgExecutor<'e>,
{
    let moods = sqlx::query_as::<_, Mood>(
        r#"
        INSERT INTO moods (name)
        SELECT * FROM UNNEST($1::TEXT[])
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id, name
        "#,
    )
    .bind(names)
    .fetch_all(db)
    .await?;

    Ok(moods)
}

pub async fn active_moods(pool: &PgPool, user_id: UserId) -> AppResult<Vec<Mood>> {
    let moods = sqlx::query_as::<_, Mood>(
        r#"
        SELECT moods.id, moods.name
        FROM user_moods
        INNER JOIN moods ON moods.id = user_moods.mood_id
        WHERE user_moods.user_id = $1
        ORDER BY moods.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(moods)
}

pub async fn activate_moods<'e, E>(db: E, user_id: UserId, mood_ids: &[MoodId]) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO user_moods (user_id, mood_id)
        SELECT $1, mood_id FROM UNNEST($2::INTEGER[]) AS mood_id
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(mood_ids)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn deactivate_mood(pool: &PgPool, user_id: UserId, mood_id: MoodId) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM user_moods WHERE user_id = $1 AND mood_id = $2")
        .bind(user_id)
        .bind(mood_id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}

pub async fn tag_post_moods<'e, E>(db: E, post_id: PostId, mood_ids: &[MoodId]) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO post_moods (post_id, mood_id)
        SELECT $1, mood_id FROM UNNEST($2::INTEGER[]) AS mood_id
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(mood_ids)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn tag_book_mood<'e, E>(db: E, book_id: BookId, mood_id: MoodId) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO book_moods (book_id, mood_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(book_id)
    .bind(mood_id)
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_dedupes() {
        let names = normalize_mood_names(&["  Happy", "happy ", "", "   ", "Melancholy"]);
        assert_eq!(names, vec!["happy".to_string(), "melancholy".to_string()]);
    }

    #[test]
    fn keeps_first_seen_order() {
        let names = normalize_mood_names(&["calm", "Anxious", "CALM"]);
        assert_eq!(names, vec!["calm".to_string(), "anxious".to_string()]);
    }
}
