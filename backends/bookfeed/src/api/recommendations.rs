use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    api::moods::check_mood_names,
    auth::AuthUser,
    db::{books_by_ids, cached_books, normalize_mood_names, BookId, PgRecommendationStore},
    error::{AppError, AppResult},
    recommend::{cache_recommendations, RecommendationProvider},
};

#[derive(Debug, Deserialize)]
pub struct MoodQuery {
    mood: Option<String>,
}

// GET /api/v1/recommendations?mood=
pub async fn recommend(
    State(pool): State<PgPool>,
    State(provider): State<Arc<dyn RecommendationProvider>>,
    AuthUser(viewer): AuthUser,
    Query(query): Query<MoodQuery>,
) -> AppResult<impl IntoResponse> {
    let mood = normalize_mood_names(&[query.mood.unwrap_or_default()])
        .pop()
        .ok_or_else(|| AppError::bad_request("Mood should not be empty."))?;
    check_mood_names(std::slice::from_ref(&mood))?;

    let suggestions = provider.recommend(&mood).await.map_err(AppError::Upstream)?;

    if suggestions.books.is_empty() {
        return Ok(Json(json!({
            "message": "No recommendations available for this mood.",
            "reasoning": suggestions.reasoning,
            "books": [],
        })));
    }

    let mut store = PgRecommendationStore::begin(&pool).await?;
    let outcome = cache_recommendations(&mut store, viewer, &mood, &suggestions.books).await?;
    store.commit().await?;

    let mut ids: Vec<BookId> = Vec::with_capacity(outcome.books.len());
    for id in outcome.book_ids() {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    let books = books_by_ids(&pool, &ids).await?;

    Ok(Json(json!({
        "mood": mood,
        "reasoning": suggestions.reasoning,
        "books": books,
        "newly_cataloged": outcome.cataloged(),
        "newly_recommended": outcome.recommended(),
    })))
}

// GET /api/v1/recommendations/cached
pub async fn cached(
    State(pool): State<PgPool>,
    AuthUser(viewer): AuthUser,
) -> AppResult<impl IntoResponse> {
    let books = cached_books(&pool, viewer).await?;
    Ok(Json(json!({ "count": books.len(), "books": books })))
}
