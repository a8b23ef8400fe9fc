use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;

use crate::{
    auth::AuthUser,
    db::{create_summary, get_book, list_user_summaries, BookId},
    error::{AppError, AppResult},
    summarize::fetch_text,
    AppState,
};

// POST /api/v1/summaries/books/:id
pub async fn summarize_book(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(book_id): Path<BookId>,
) -> AppResult<impl IntoResponse> {
    let book = get_book(&state.pool, book_id).await?;
    let file_url = book
        .file_url
        .as_deref()
        .ok_or_else(|| AppError::bad_request("This book has no file to summarize."))?;

    let excerpt = fetch_text(&state.http, file_url, state.summary_max_chars)
        .await
        .map_err(AppError::Upstream)?;

    let summary = state
        .summarizer
        .summarize(&excerpt)
        .await
        .map_err(AppError::Upstream)?;

    if summary.is_empty() {
        return Ok((
            StatusCode::OK,
            Json(json!({ "message": "Summary is empty." })),
        ));
    }

    let summary = create_summary(&state.pool, user_id, book_id, &summary).await?;

    info!(book_id, user_id, chars = excerpt.chars().count(), "book summarized");
    Ok((StatusCode::CREATED, Json(json!({ "summary": summary }))))
}

// GET /api/v1/summaries
pub async fn get_summaries(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let summaries = list_user_summaries(&pool, user_id).await?;
    Ok(Json(json!({ "count": summaries.len(), "summaries": summaries })))
}
