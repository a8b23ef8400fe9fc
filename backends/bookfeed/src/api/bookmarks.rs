use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    auth::AuthUser,
    db::{
        book_exists, clear_bookmarks, create_bookmark, delete_bookmark, list_bookmarks,
        update_bookmark, BookId, BookmarkId,
    },
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    WantToRead,
    Reading,
    Finished,
}

impl ReadingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "want_to_read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Finished => "finished",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BookmarkFields {
    status: Option<ReadingStatus>,
    personal_note: Option<String>,
}

// GET /api/v1/bookmarks
pub async fn get_bookmarks(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let bookmarks = list_bookmarks(&pool, user_id).await?;
    Ok(Json(json!({ "count": bookmarks.len(), "bookmarks": bookmarks })))
}

// POST /api/v1/bookmarks/:book_id
pub async fn add(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(book_id): Path<BookId>,
    fields: Option<Json<BookmarkFields>>,
) -> AppResult<impl IntoResponse> {
    let fields = fields.map(|Json(fields)| fields).unwrap_or_default();

    if !book_exists(&pool, book_id).await? {
        return Err(AppError::not_found("Book not found."));
    }

    let bookmark_id = create_bookmark(
        &pool,
        user_id,
        book_id,
        fields.status.map(ReadingStatus::as_str),
        fields.personal_note.as_deref(),
    )
    .await?
    .ok_or(AppError::conflict("Book is already bookmarked."))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Successfully added to bookmarks.", "id": bookmark_id })),
    ))
}

// PUT /api/v1/bookmarks/:id
pub async fn update(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(bookmark_id): Path<BookmarkId>,
    Json(fields): Json<BookmarkFields>,
) -> AppResult<impl IntoResponse> {
    let updated = update_bookmark(
        &pool,
        bookmark_id,
        user_id,
        fields.status.map(ReadingStatus::as_str),
        fields.personal_note.as_deref(),
    )
    .await?;

    if !updated {
        return Err(AppError::not_found("Bookmark not found."));
    }

    Ok(Json(json!({ "message": "Bookmark updated." })))
}

// DELETE /api/v1/bookmarks/:id
pub async fn remove(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(bookmark_id): Path<BookmarkId>,
) -> AppResult<impl IntoResponse> {
    if !delete_bookmark(&pool, bookmark_id, user_id).await? {
        return Err(AppError::not_found("Bookmark not found."));
    }

    Ok(Json(json!({ "message": "Successfully removed from bookmarks." })))
}

// DELETE /api/v1/bookmarks
pub async fn clear(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let removed = clear_bookmarks(&pool, user_id).await?;
    Ok(Json(json!({ "message": "Bookmarks cleared.", "removed": removed })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_status_names() {
        let fields: BookmarkFields =
            serde_json::from_str(r#"{"status": "want_to_read", "personal_note": "after Emma"}"#)
                .unwrap();

        assert_eq!(fields.status, Some(ReadingStatus::WantToRead));
        assert_eq!(fields.status.map(ReadingStatus::as_str), Some("want_to_read"));
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(serde_json::from_str::<BookmarkFields>(r#"{"status": "abandoned"}"#).is_err());
    }
}
