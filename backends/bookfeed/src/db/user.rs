use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};

pub type UserId = i32;

#[derive(Debug, Serialize, FromRow)]
pub struct User {
    pub id: UserId,
    #[serde(skip)]
    pub hash: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub following: bool,
}

/// Minimal user reference used in follower listings.
#[derive(Debug, Serialize, FromRow)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub bio: &'a str,
    pub image: Option<&'a str>,
    pub hash: &'a str,
}

#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub hash: Option<String>,
}

pub async fn create_user(pool: &PgPool, user: NewUser<'_>) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, bio, image, hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.bio)
    .bind(user.image)
    .bind(user.hash)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_user(pool: &PgPool, user_id: UserId) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    user.ok_or(AppError::not_found("User not found."))
}

pub async fn user_exists(pool: &PgPool, user_id: UserId) -> AppResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(exists)
}

/// Which unique field, if any, is already taken by another account.
pub async fn taken_identity(
    pool: &PgPool,
    username: Option<&str>,
    email: Option<&str>,
    except: Option<UserId>,
) -> AppResult<Option<&'static str>> {
    let (email_taken, username_taken) = sqlx::query_as::<_, (bool, bool)>(
        r#"
        SELECT
            EXISTS (SELECT 1 FROM users WHERE email = $1 AND id IS DISTINCT FROM $3),
            EXISTS (SELECT 1 FROM users WHERE username = $2 AND id IS DISTINCT FROM $3)
        "#,
    )
    .bind(email)
    .bind(username)
    .bind(except)
    .fetch_one(pool)
    .await?;

    Ok(if email_taken {
        Some("Email already exist.")
    } else if username_taken {
        Some("Username already exist.")
    } else {
        None
    })
}

pub async fn get_user_profile(
    pool: &PgPool,
    user_id: UserId,
    req_user_id: Option<UserId>,
) -> AppResult<Profile> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        SELECT
            users.id,
            users.username,
            users.bio,
            users.image,
            (SELECT COUNT(*) FROM follows WHERE follows.followee_id = users.id) AS followers_count,
            (SELECT COUNT(*) FROM follows WHERE follows.follower_id = users.id) AS following_count,
            EXISTS (
                SELECT 1
                FROM follows
                WHERE follows.follower_id = $2
                    AND follows.followee_id = users.id
            ) AS following
        FROM users
        WHERE users.id = $1
        "#,
    )
    .bind(user_id)
    .bind(req_user_id)
    .fetch_optional(pool)
    .await?;

    profile.ok_or(AppError::not_found("User not found."))
}

pub async fn update_user(pool: &PgPool, user_id: UserId, changes: UserChanges) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
            SET (email, username, bio, image, hash, updated_at) =
                (
                    COALESCE($1, email),
                    COALESCE($2, username),
                    COALESCE($3, bio),
                    COALESCE($4, image),
                    COALESCE($5, hash),
                    NOW()
                )
            WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(changes.email)
    .bind(changes.username)
    .bind(changes.bio)
    .bind(changes.image)
    .bind(changes.hash)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    user.ok_or(AppError::not_found("User not found."))
}
