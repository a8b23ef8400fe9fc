use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    auth::AuthUser,
    db::{create_like, delete_like, post_author, PostId},
    error::{AppError, AppResult},
    notify::{self, NotificationEvent},
};

// POST /api/v1/posts/:id/like
pub async fn like(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<PostId>,
) -> AppResult<impl IntoResponse> {
    let mut tx = pool.begin().await?;

    let author = post_author(&mut *tx, post_id)
        .await?
        .ok_or(AppError::not_found("Post not found."))?;

    if !create_like(&mut *tx, user_id, post_id).await? {
        return Err(AppError::conflict("You already liked this post."));
    }

    notify::emit(&mut tx, NotificationEvent::Liked, user_id, author).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "Post liked." }))))
}

// POST /api/v1/posts/:id/unlike
pub async fn unlike(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<PostId>,
) -> AppResult<impl IntoResponse> {
    if !delete_like(&pool, user_id, post_id).await? {
        return Err(AppError::not_found("You have not liked this post."));
    }

    Ok(Json(json!({ "message": "Post unliked." })))
}
