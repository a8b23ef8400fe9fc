use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use validator::Validate;

use crate::{
    api::{moods::check_mood_names, LimitOffset},
    auth::AuthUser,
    db::{
        self, book_exists, create_post, get_post, list_posts, list_user_posts,
        normalize_mood_names, post_author, tag_post_moods, upsert_moods, BookId, MoodId, PostId,
        UserId,
    },
    error::{AppError, AppResult},
};

#[derive(Deserialize, Validate)]
pub struct CreatePost {
    #[validate(length(min = 1, message = "content can't be blank"))]
    content: String,
    book_id: Option<BookId>,
    #[validate(url(message = "image must be a URL"))]
    image_url: Option<String>,
    #[serde(default)]
    moods: Vec<String>,
}

#[derive(Deserialize, Validate)]
pub struct UpdatePost {
    #[validate(length(min = 1, message = "content can't be blank"))]
    content: Option<String>,
    #[validate(url(message = "image must be a URL"))]
    image_url: Option<String>,
}

// GET /api/v1/posts
pub async fn get_posts(
    State(pool): State<PgPool>,
    _: AuthUser,
    Query(query): Query<LimitOffset>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = query.window();
    let posts = list_posts(&pool, limit, offset).await?;
    Ok(Json(json!({ "count": posts.len(), "posts": posts })))
}

// GET /api/v1/users/:id/posts
pub async fn user_posts(
    State(pool): State<PgPool>,
    _: AuthUser,
    Path(user_id): Path<UserId>,
) -> AppResult<impl IntoResponse> {
    if !db::user_exists(&pool, user_id).await? {
        return Err(AppError::not_found("User not found."));
    }

    let posts = list_user_posts(&pool, user_id).await?;
    Ok(Json(json!({ "count": posts.len(), "posts": posts })))
}

// POST /api/v1/posts
pub async fn create(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Json(post): Json<CreatePost>,
) -> AppResult<impl IntoResponse> {
    post.validate()?;

    let moods = normalize_mood_names(&post.moods);
    check_mood_names(&moods)?;

    let mut tx = pool.begin().await?;

    if let Some(book_id) = post.book_id {
        if !book_exists(&mut *tx, book_id).await? {
            return Err(AppError::not_found("Book not found."));
        }
    }

    let post_id = create_post(
        &mut *tx,
        user_id,
        post.book_id,
        &post.content,
        post.image_url.as_deref(),
    )
    .await?;

    if !moods.is_empty() {
        let mood_ids: Vec<MoodId> = upsert_moods(&mut *tx, &moods)
            .await?
            .into_iter()
            .map(|mood| mood.id)
            .collect();
        tag_post_moods(&mut *tx, post_id, &mood_ids).await?;
    }

    tx.commit().await?;

    info!(post_id, user_id, moods = moods.len(), "post created");
    let post = get_post(&pool, post_id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "post": post }))))
}

// GET /api/v1/posts/:id
pub async fn get_one(
    State(pool): State<PgPool>,
    _: AuthUser,
    Path(post_id): Path<PostId>,
) -> AppResult<impl IntoResponse> {
    let post = get_post(&pool, post_id).await?;
    Ok(Json(json!({ "post": post })))
}

async fn ensure_author(pool: &PgPool, post_id: PostId, user_id: UserId, action: &'static str) -> AppResult<()> {
    match post_author(pool, post_id).await? {
        None => Err(AppError::not_found("Post not found.")),
        Some(author) if author != user_id => Err(AppError::Forbidden(action)),
        Some(_) => Ok(()),
    }
}

// PUT /api/v1/posts/:id
pub async fn update(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<PostId>,
    Json(changes): Json<UpdatePost>,
) -> AppResult<impl IntoResponse> {
    changes.validate()?;
    ensure_author(&pool, post_id, user_id, "You can only edit your own posts.").await?;

    db::update_post(
        &pool,
        post_id,
        user_id,
        changes.content.as_deref(),
        changes.image_url.as_deref(),
    )
    .await?;

    let post = get_post(&pool, post_id).await?;
    Ok(Json(json!({ "post": post })))
}

// DELETE /api/v1/posts/:id
pub async fn delete(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<PostId>,
) -> AppResult<impl IntoResponse> {
    ensure_author(&pool, post_id, user_id, "You can only delete your own posts.").await?;
    db::delete_post(&pool, post_id, user_id).await?;

    Ok(Json(json!({ "message": "Post deleted." })))
}
