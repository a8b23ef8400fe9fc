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
    db::{
        attach_book_tag, book_exists, create_tag, delete_tag, detach_book_tag, ensure_tag,
        list_book_tags, list_tags, BookId, TagId,
    },
    error::{AppError, AppResult},
};

#[derive(Debug, Deserialize, Validate)]
pub struct TagName {
    #[validate(length(min = 1, max = 50, message = "tag name must be 1 to 50 characters"))]
    name: String,
}

impl TagName {
    fn normalized(&self) -> &str {
        self.name.trim()
    }
}

// GET /api/v1/tags
pub async fn get_tags(State(pool): State<PgPool>, _: AuthUser) -> AppResult<impl IntoResponse> {
    let tags = list_tags(&pool).await?;
    Ok(Json(json!({ "tags": tags })))
}

// POST /api/v1/tags
pub async fn create(
    State(pool): State<PgPool>,
    _: AuthUser,
    Json(tag): Json<TagName>,
) -> AppResult<impl IntoResponse> {
    tag.validate()?;
    if tag.normalized().is_empty() {
        return Err(AppError::bad_request("Tag name can't be blank."));
    }

    let tag = create_tag(&pool, tag.normalized())
        .await?
        .ok_or(AppError::conflict("Tag already exists."))?;

    Ok((StatusCode::CREATED, Json(json!({ "tag": tag }))))
}

// DELETE /api/v1/tags/:id
pub async fn delete(
    State(pool): State<PgPool>,
    _: AuthUser,
    Path(tag_id): Path<TagId>,
) -> AppResult<impl IntoResponse> {
    if !delete_tag(&pool, tag_id).await? {
        return Err(AppError::not_found("Tag not found."));
    }

    Ok(Json(json!({ "message": "Tag deleted." })))
}

// POST /api/v1/books/:id/tags
pub async fn attach(
    State(pool): State<PgPool>,
    _: AuthUser,
    Path(book_id): Path<BookId>,
    Json(tag): Json<TagName>,
) -> AppResult<impl IntoResponse> {
    tag.validate()?;
    if tag.normalized().is_empty() {
        return Err(AppError::bad_request("Tag name can't be blank."));
    }

    let mut tx = pool.begin().await?;

    if !book_exists(&mut *tx, book_id).await? {
        return Err(AppError::not_found("Book not found."));
    }

    let tag = ensure_tag(&mut *tx, tag.normalized()).await?;
    if !attach_book_tag(&mut *tx, book_id, tag.id).await? {
        return Err(AppError::conflict("Tag already attached to this book."));
    }

    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(json!({ "tag": tag }))))
}

// GET /api/v1/books/:id/tags
pub async fn book_tags(
    State(pool): State<PgPool>,
    _: AuthUser,
    Path(book_id): Path<BookId>,
) -> AppResult<impl IntoResponse> {
    if !book_exists(&pool, book_id).await? {
        return Err(AppError::not_found("Book not found."));
    }

    let tags = list_book_tags(&pool, book_id).await?;
    Ok(Json(json!({ "tags": tags })))
}

// DELETE /api/v1/books/:id/tags/:tag_id
pub async fn detach(
    State(pool): State<PgPool>,
    _: AuthUser,
    Path((book_id, tag_id)): Path<(BookId, TagId)>,
) -> AppResult<impl IntoResponse> {
    if !detach_book_tag(&pool, book_id, tag_id).await? {
        return Err(AppError::not_found("Tag is not attached to this book."));
    }

    Ok(Json(json!({ "message": "Tag removed from book." })))
}
