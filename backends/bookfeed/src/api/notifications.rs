use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    auth::AuthUser,
    db::{
        delete_notification, list_notifications, mark_all_notifications_read, read_notification,
        NotificationId,
    },
    error::{AppError, AppResult},
};

// GET /api/v1/notifications
pub async fn get_notifications(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let notifications = list_notifications(&pool, user_id).await?;
    let unread = notifications.iter().filter(|n| !n.is_read).count();

    Ok(Json(json!({
        "count": notifications.len(),
        "unread": unread,
        "notifications": notifications,
    })))
}

// GET /api/v1/notifications/:id
pub async fn get_one(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(notification_id): Path<NotificationId>,
) -> AppResult<impl IntoResponse> {
    let notification = read_notification(&pool, notification_id, user_id)
        .await?
        .ok_or(AppError::not_found("Notification not found."))?;

    Ok(Json(json!({ "notification": notification })))
}

// DELETE /api/v1/notifications/:id
pub async fn delete(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(notification_id): Path<NotificationId>,
) -> AppResult<impl IntoResponse> {
    if !delete_notification(&pool, notification_id, user_id).await? {
        return Err(AppError::not_found("Notification not found."));
    }

    Ok(Json(json!({ "message": "Notification deleted." })))
}

// POST /api/v1/notifications/read
pub async fn read_all(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let updated = mark_all_notifications_read(&pool, user_id).await?;
    Ok(Json(json!({ "updated": updated })))
}
