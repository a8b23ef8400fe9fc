use axum::{
    extract::{Path, State},
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
        activate_moods, active_moods, deactivate_mood, list_moods, normalize_mood_names,
        upsert_moods, MoodId,
    },
    error::{AppError, AppResult},
};

const MAX_MOOD_LEN: usize = 50;

pub(crate) fn check_mood_names(names: &[String]) -> AppResult<()> {
    if names.iter().any(|name| name.chars().count() > MAX_MOOD_LEN) {
        return Err(AppError::bad_request("Mood names are limited to 50 characters."));
    }
    Ok(())
}

#[derive(Deserialize, Validate)]
pub struct SetMoods {
    #[validate(length(min = 1, message = "at least one mood is required"))]
    moods: Vec<String>,
}

// GET /api/v1/moods
pub async fn get_moods(State(pool): State<PgPool>, _: AuthUser) -> AppResult<impl IntoResponse> {
    let moods = list_moods(&pool).await?;
    Ok(Json(json!({ "moods": moods })))
}

// GET /api/v1/moods/active
pub async fn get_active(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let moods = active_moods(&pool, user_id).await?;
    Ok(Json(json!({ "moods": moods })))
}

// POST /api/v1/moods/active
pub async fn activate(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<SetMoods>,
) -> AppResult<impl IntoResponse> {
    request.validate()?;

    let names = normalize_mood_names(&request.moods);
    if names.is_empty() {
        return Err(AppError::bad_request("Mood should not be empty."));
    }
    check_mood_names(&names)?;

    let mut tx = pool.begin().await?;
    let mood_ids: Vec<MoodId> = upsert_moods(&mut *tx, &names)
        .await?
        .into_iter()
        .map(|mood| mood.id)
        .collect();
    activate_moods(&mut *tx, user_id, &mood_ids).await?;
    tx.commit().await?;

    let moods = active_moods(&pool, user_id).await?;
    Ok(Json(json!({ "moods": moods })))
}

// DELETE /api/v1/moods/active/:id
pub async fn deactivate(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(mood_id): Path<MoodId>,
) -> AppResult<impl IntoResponse> {
    if !deactivate_mood(&pool, user_id, mood_id).await? {
        return Err(AppError::not_found("Mood is not active."));
    }

    Ok(Json(json!({ "message": "Mood deactivated." })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_mood_name_length() {
        assert!(check_mood_names(&["calm".to_string()]).is_ok());
        assert!(check_mood_names(&["x".repeat(51)]).is_err());
        assert!(check_mood_names(&["é".repeat(50)]).is_ok());
    }
}
