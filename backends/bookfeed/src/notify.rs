use sqlx::PgConnection;
use tracing::debug;

use crate::{
    db::{insert_notification, UserId},
    error::AppResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    Liked,
    Commented,
    Followed,
}

impl NotificationEvent {
    pub fn message(self, actor: &str) -> String {
        match self {
            NotificationEvent::Liked => format!("{actor} liked your post."),
            NotificationEvent::Commented => format!("{actor} commented on your post."),
            NotificationEvent::Followed => format!("{actor} started following you."),
        }
    }
}

/// Nobody is notified about their own actions.
pub fn should_notify(actor: UserId, target: UserId) -> bool {
    actor != target
}

/// Records one notification for `target`. Runs on the caller's connection so
/// it commits or rolls back together with the action that triggered it.
/// Returns whether a notification was written.
pub async fn emit(
    conn: &mut PgConnection,
    event: NotificationEvent,
    actor: UserId,
    target: UserId,
) -> AppResult<bool> {
    if !should_notify(actor, target) {
        debug!(?event, actor, "skipping self notification");
        return Ok(false);
    }

    let actor_name = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
        .bind(actor)
        .fetch_one(&mut *conn)
        .await?;

    insert_notification(&mut *conn, target, &event.message(&actor_name)).await?;
    debug!(?event, actor, target, "notification emitted");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_actor() {
        assert_eq!(NotificationEvent::Liked.message("ada"), "ada liked your post.");
        assert_eq!(
            NotificationEvent::Commented.message("ada"),
            "ada commented on your post."
        );
        assert_eq!(
            NotificationEvent::Followed.message("ada"),
            "ada started following you."
        );
    }

    #[test]
    fn self_actions_are_silent() {
        assert!(!should_notify(3, 3));
        assert!(should_notify(3, 4));
    }
}
