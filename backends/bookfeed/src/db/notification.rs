use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};

use crate::error::AppResult;

use super::UserId;

pub type NotificationId = i32;

#[derive(Debug, Serialize, FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_notification<'e, E>(db: E, user_id: UserId, message: &str) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("INSERT INTO notifications (user_id, message) VALUES ($1, $2)")
        .bind(user_id)
        .bind(message)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn list_notifications(pool: &PgPool, user_id: UserId) -> AppResult<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, message, is_read, created_at
        FROM notifications
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

/// Marks the notification read and returns it.
pub async fn read_notification(
    pool: &PgPool,
    notification_id: NotificationId,
    user_id: UserId,
) -> AppResult<Option<Notification>> {
    let notification = sqlx::query_as::<_, Notification>(
        r#"
        UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
        RETURNING id, message, is_read, created_at
        "#,
    )
    .bind(notification_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(notification)
}

pub async fn delete_notification(
    pool: &PgPool,
    notification_id: NotificationId,
    user_id: UserId,
) -> AppResult<bool> {
    let affected = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected > 0)
}

pub async fn mark_all_notifications_read(pool: &PgPool, user_id: UserId) -> AppResult<u64> {
    let affected = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}
