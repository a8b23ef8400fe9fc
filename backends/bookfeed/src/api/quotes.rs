use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    auth::AuthUser,
    db::{book_exists, create_quote, delete_quote, get_quote, list_user_quotes, BookId, QuoteId},
    error::{AppError, AppResult},
};

#[derive(Deserialize, Validate)]
pub struct AddQuote {
    #[validate(length(min = 1, message = "quote can't be blank"))]
    content: String,
}

// GET /api/v1/quotes
pub async fn get_quotes(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let quotes = list_user_quotes(&pool, user_id, None).await?;
    Ok(Json(json!({ "count": quotes.len(), "quotes": quotes })))
}

// GET /api/v1/quotes/books/:book_id
pub async fn book_quotes(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(book_id): Path<BookId>,
) -> AppResult<impl IntoResponse> {
    if !book_exists(&pool, book_id).await? {
        return Err(AppError::not_found("Book not found."));
    }

    let quotes = list_user_quotes(&pool, user_id, Some(book_id)).await?;
    Ok(Json(json!({ "count": quotes.len(), "quotes": quotes })))
}

// POST /api/v1/quotes/books/:book_id
pub async fn create(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(book_id): Path<BookId>,
    Json(quote): Json<AddQuote>,
) -> AppResult<impl IntoResponse> {
    quote.validate()?;

    if !book_exists(&pool, book_id).await? {
        return Err(AppError::not_found("Book not found."));
    }

    let quote_id = create_quote(&pool, user_id, book_id, &quote.content).await?;
    let quote = get_quote(&pool, quote_id)
        .await?
        .ok_or(AppError::not_found("Quote not found."))?;

    Ok((StatusCode::CREATED, Json(json!({ "quote": quote }))))
}

// GET /api/v1/quotes/:id
pub async fn get_one(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(quote_id): Path<QuoteId>,
) -> AppResult<impl IntoResponse> {
    let quote = get_quote(&pool, quote_id)
        .await?
        .filter(|quote| quote.user_id == user_id)
        .ok_or(AppError::not_found("Quote not found."))?;

    Ok(Json(json!({ "quote": quote })))
}

// DELETE /api/v1/quotes/:id
pub async fn delete(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(quote_id): Path<QuoteId>,
) -> AppResult<impl IntoResponse> {
    if !delete_quote(&pool, quote_id, user_id).await? {
        return Err(AppError::not_found("Quote not found."));
    }

    Ok(Json(json!({ "message": "Quote deleted." })))
}
