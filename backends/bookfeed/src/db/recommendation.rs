use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    recommend::RecommendationStore,
};

use super::{create_book, tag_book_mood, upsert_moods, Book, BookId, MoodId, NewBook, UserId, SELECT_BOOK};

/// Recommendation cache writes, all inside one transaction.
pub struct PgRecommendationStore {
    tx: Transaction<'static, Postgres>,
}

impl PgRecommendationStore {
    pub async fn begin(pool: &PgPool) -> AppResult<Self> {
        Ok(Self { tx: pool.begin().await? })
    }

    pub async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn ensure_mood(&mut self, name: &str) -> AppResult<MoodId> {
        let moods = upsert_moods(&mut *self.tx, &[name.to_string()]).await?;

        moods
            .first()
            .map(|mood| mood.id)
            .ok_or_else(|| AppError::Anyhow(anyhow::anyhow!("mood upsert returned no row")))
    }

    async fn find_book(&mut self, book: &NewBook) -> AppResult<Option<BookId>> {
        let id = sqlx::query_scalar::<_, BookId>(
            r#"
            SELECT id FROM books
            WHERE ($1::TEXT IS NOT NULL AND isbn = $1)
                OR LOWER(title) = LOWER($2)
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn insert_book(&mut self, owner: UserId, book: &NewBook) -> AppResult<BookId> {
        create_book(&mut *self.tx, owner, book).await
    }

    async fn tag_book_mood(&mut self, book_id: BookId, mood_id: MoodId) -> AppResult<()> {
        tag_book_mood(&mut *self.tx, book_id, mood_id).await
    }

    async fn link_recommendation(&mut self, user_id: UserId, book_id: BookId) -> AppResult<bool> {
        let inserted = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO user_recommendations (user_id, book_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, book_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(inserted.is_some())
    }
}

/// Every book ever recommended to `user_id`, most recent first.
pub async fn cached_books(pool: &PgPool, user_id: UserId) -> AppResult<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(&format!(
        r#"{SELECT_BOOK}
        INNER JOIN user_recommendations ON user_recommendations.book_id = books.id
        WHERE user_recommendations.user_id = $1
        ORDER BY user_recommendations.created_at DESC, books.id DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(books)
}

pub async fn books_by_ids(pool: &PgPool, ids: &[BookId]) -> AppResult<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(&format!(
        "{SELECT_BOOK} WHERE books.id = ANY($1) ORDER BY array_position($1, books.id)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(books)
}
