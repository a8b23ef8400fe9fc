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
    db::{create_comment, delete_comment, list_comments, post_author, CommentId, PostId},
    error::{AppError, AppResult},
    notify::{self, NotificationEvent},
};

#[derive(Deserialize, Validate)]
pub struct AddComment {
    #[validate(length(min = 1, message = "comment can't be blank"))]
    content: String,
}

// POST /api/v1/posts/:id/comments
pub async fn create(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<PostId>,
    Json(comment): Json<AddComment>,
) -> AppResult<impl IntoResponse> {
    comment.validate()?;

    let mut tx = pool.begin().await?;

    let author = post_author(&mut *tx, post_id)
        .await?
        .ok_or(AppError::not_found("Post not found."))?;

    let comment = create_comment(&mut *tx, post_id, user_id, &comment.content).await?;
    notify::emit(&mut tx, NotificationEvent::Commented, user_id, author).await?;

    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(json!({ "comment": comment }))))
}

// GET /api/v1/posts/:id/comments
pub async fn get_comments(
    State(pool): State<PgPool>,
    _: AuthUser,
    Path(post_id): Path<PostId>,
) -> AppResult<impl IntoResponse> {
    if post_author(&pool, post_id).await?.is_none() {
        return Err(AppError::not_found("Post not found."));
    }

    let comments = list_comments(&pool, post_id).await?;
    Ok(Json(json!({ "count": comments.len(), "comments": comments })))
}

// DELETE /api/v1/comments/:id
pub async fn delete(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<CommentId>,
) -> AppResult<impl IntoResponse> {
    if !delete_comment(&pool, comment_id, user_id).await? {
        return Err(AppError::not_found("Comment not found."));
    }

    Ok(Json(json!({ "message": "Comment deleted." })))
}
