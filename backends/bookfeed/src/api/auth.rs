use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::{
    auth::{AuthUser, RefreshUser},
    db::{create_user, find_user_by_email, get_user, taken_identity, user_exists, NewUser},
    error::{AppError, AppResult},
    utils::{
        hasher,
        jwt::{JwtKeys, TokenKind},
    },
};

pub(crate) fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Ok(());
    }

    let mut error = ValidationError::new("alphanumeric");
    error.message = Some("username may only contain letters and digits".into());
    Err(error)
}

// ================================================= REGISTRATION ================================================= //

#[derive(Deserialize, Validate)]
pub struct Registration {
    #[validate(
        length(min = 3, message = "username is too short"),
        length(max = 32, message = "username is too long"),
        custom = "validate_username"
    )]
    username: String,

    #[validate(email(message = "email is not valid"))]
    email: String,

    #[validate(length(min = 8, message = "password must be at least 8 characters long"))]
    password: String,

    confirm_password: String,

    #[validate(length(min = 1, message = "bio can't be blank"))]
    bio: String,

    #[validate(url(message = "image must be a URL"))]
    image: Option<String>,
}

impl Registration {
    fn passwords_match(&self) -> bool {
        self.password == self.confirm_password
    }
}

// POST /api/v1/auth/register
pub async fn register(
    State(pool): State<PgPool>,
    Json(registration): Json<Registration>,
) -> AppResult<impl IntoResponse> {
    registration.validate()?;
    if !registration.passwords_match() {
        return Err(AppError::bad_request("Passwords do not match."));
    }

    if let Some(taken) = taken_identity(
        &pool,
        Some(&registration.username),
        Some(&registration.email),
        None,
    )
    .await?
    {
        return Err(AppError::conflict(taken));
    }

    let hash = hasher::hash_password(&registration.password)?;
    let user = create_user(
        &pool,
        NewUser {
            username: &registration.username,
            email: &registration.email,
            bio: &registration.bio,
            image: registration.image.as_deref(),
            hash: &hash,
        },
    )
    .await?;

    info!(user_id = user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created.", "user": user })),
    ))
}

// ================================================= LOGIN ================================================= //

#[derive(Debug, Deserialize, Validate)]
pub struct Login {
    #[validate(email(message = "invalid email address"))]
    email: String,
    #[validate(length(min = 1, message = "password can't be blank"))]
    password: String,
}

// POST /api/v1/auth/login
pub async fn login(
    State(pool): State<PgPool>,
    State(jwt): State<JwtKeys>,
    Json(login): Json<Login>,
) -> AppResult<impl IntoResponse> {
    login.validate()?;

    let wrong_credentials = || AppError::bad_request("Wrong username or password.");

    let user = find_user_by_email(&pool, &login.email)
        .await?
        .ok_or_else(wrong_credentials)?;

    if !hasher::verify_password(&user.hash, &login.password)? {
        return Err(wrong_credentials());
    }

    let access = jwt.generate(user.id, TokenKind::Access)?;
    let refresh = jwt.generate(user.id, TokenKind::Refresh)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(json!({
        "user": {
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "access_token": access,
            "refresh_token": refresh,
        }
    })))
}

// GET /api/v1/auth/me, GET /api/v1/users/me
pub async fn me(State(pool): State<PgPool>, AuthUser(user_id): AuthUser) -> AppResult<impl IntoResponse> {
    let user = get_user(&pool, user_id).await?;
    Ok(Json(json!({ "user": user })))
}

// POST /api/v1/auth/token/refresh
pub async fn refresh_token(
    State(pool): State<PgPool>,
    State(jwt): State<JwtKeys>,
    RefreshUser(user_id): RefreshUser,
) -> AppResult<impl IntoResponse> {
    if !user_exists(&pool, user_id).await? {
        return Err(AppError::Unauthorized);
    }

    let access = jwt.generate(user_id, TokenKind::Access)?;
    Ok(Json(json!({ "access_token": access })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            username: "austen".to_string(),
            email: "jane@example.com".to_string(),
            password: "pemberley".to_string(),
            confirm_password: "pemberley".to_string(),
            bio: "Novelist".to_string(),
            image: None,
        }
    }

    #[test]
    fn accepts_a_complete_registration() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn detects_mismatched_passwords() {
        let mut form = registration();
        assert!(form.passwords_match());

        form.confirm_password = "netherfield".to_string();
        assert!(!form.passwords_match());
    }

    #[test]
    fn rejects_short_or_symbolic_usernames() {
        let mut form = registration();
        form.username = "jo".to_string();
        assert!(form.validate().unwrap_err().field_errors().contains_key("username"));

        let mut form = registration();
        form.username = "jane austen!".to_string();
        assert!(form.validate().unwrap_err().field_errors().contains_key("username"));
    }

    #[test]
    fn rejects_short_passwords_and_bad_emails() {
        let mut form = registration();
        form.password = "short".to_string();
        form.confirm_password = "short".to_string();
        form.email = "not-an-email".to_string();

        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("email"));
    }
}
