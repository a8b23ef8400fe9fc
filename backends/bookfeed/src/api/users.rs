use axum::{
    extract::{Path, State},
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
    api::auth::validate_username,
    auth::AuthUser,
    db::{
        self, create_follow, delete_follow, get_user_profile, list_followers, list_following,
        taken_identity, user_exists, UserChanges, UserId,
    },
    error::{AppError, AppResult},
    notify::{self, NotificationEvent},
    utils::hasher,
};

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUser {
    pub bio: Option<String>,
    #[validate(url(message = "image must be a URL"))]
    pub image: Option<String>,
    #[validate(email(message = "email is not valid"))]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 32), custom = "validate_username")]
    pub username: Option<String>,
    #[validate(length(min = 8, message = "password must be at least 8 characters long"))]
    pub password: Option<String>,
}

// GET /api/v1/users/:id
pub async fn get_profile(
    State(pool): State<PgPool>,
    AuthUser(viewer): AuthUser,
    Path(user_id): Path<UserId>,
) -> AppResult<impl IntoResponse> {
    let profile = get_user_profile(&pool, user_id, Some(viewer)).await?;
    Ok(Json(json!({ "profile": profile })))
}

// PUT /api/v1/users/me
pub async fn update_me(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Json(update): Json<UpdateUser>,
) -> AppResult<impl IntoResponse> {
    update.validate()?;

    if let Some(taken) = taken_identity(
        &pool,
        update.username.as_deref(),
        update.email.as_deref(),
        Some(user_id),
    )
    .await?
    {
        return Err(AppError::conflict(taken));
    }

    let hash = update.password.map(hasher::hash_password).transpose()?;
    let user = db::update_user(
        &pool,
        user_id,
        UserChanges {
            email: update.email,
            username: update.username,
            bio: update.bio,
            image: update.image,
            hash,
        },
    )
    .await?;

    Ok(Json(json!({ "user": user })))
}

// POST /api/v1/users/:id/follow
pub async fn follow(
    State(pool): State<PgPool>,
    AuthUser(follower): AuthUser,
    Path(followee): Path<UserId>,
) -> AppResult<impl IntoResponse> {
    if follower == followee {
        return Err(AppError::bad_request("You cannot follow yourself."));
    }
    if !user_exists(&pool, followee).await? {
        return Err(AppError::not_found("User not found."));
    }

    let mut tx = pool.begin().await?;

    if !create_follow(&mut *tx, follower, followee).await? {
        return Ok((
            StatusCode::OK,
            Json(json!({ "message": "Already following this user." })),
        ));
    }

    notify::emit(&mut tx, NotificationEvent::Followed, follower, followee).await?;
    tx.commit().await?;

    info!(follower, followee, "user followed");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "You are now following this user." })),
    ))
}

// POST /api/v1/users/:id/unfollow
pub async fn unfollow(
    State(pool): State<PgPool>,
    AuthUser(follower): AuthUser,
    Path(followee): Path<UserId>,
) -> AppResult<impl IntoResponse> {
    if follower == followee {
        return Err(AppError::bad_request("You cannot unfollow yourself."));
    }
    if !user_exists(&pool, followee).await? {
        return Err(AppError::not_found("User not found."));
    }

    if !delete_follow(&pool, follower, followee).await? {
        return Err(AppError::bad_request("You are not following this user."));
    }

    Ok(Json(json!({ "message": "You have unfollowed this user." })))
}

// GET /api/v1/users/:id/followers
pub async fn followers(
    State(pool): State<PgPool>,
    _: AuthUser,
    Path(user_id): Path<UserId>,
) -> AppResult<impl IntoResponse> {
    if !user_exists(&pool, user_id).await? {
        return Err(AppError::not_found("User not found."));
    }

    let followers = list_followers(&pool, user_id).await?;
    Ok(Json(json!({ "count": followers.len(), "followers": followers })))
}

// GET /api/v1/users/:id/following
pub async fn following(
    State(pool): State<PgPool>,
    _: AuthUser,
    Path(user_id): Path<UserId>,
) -> AppResult<impl IntoResponse> {
    if !user_exists(&pool, user_id).await? {
        return Err(AppError::not_found("User not found."));
    }

    let following = list_following(&pool, user_id).await?;
    Ok(Json(json!({ "count": following.len(), "following": following })))
}
