//! Notification persistence operations.

use chrono::{DateTime, Utc};
use rpms_core::{NotificationId, PaperId, Timestamp, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::Notification;

/// Insert a notification.
pub async fn insert(pool: &PgPool, notification: &Notification) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO notifications (id, user_id, message, paper_id, is_read, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(notification.id.0)
    .bind(notification.user_id.0)
    .bind(&notification.message)
    .bind(notification.paper_id.map(|p| p.0))
    .bind(notification.is_read)
    .bind(notification.created_at.into_datetime())
    .execute(pool)
    .await?;

    Ok(())
}

/// A user's notifications, newest first.
pub async fn list_for_user(pool: &PgPool, user: UserId) -> Result<Vec<Notification>, StoreError> {
    let rows = sqlx::query_as::<_, NotificationRow>(
        "SELECT id, user_id, message, paper_id, is_read, created_at
         FROM notifications WHERE user_id = $1
         ORDER BY created_at DESC",
    )
    .bind(user.0)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(NotificationRow::into_notification).collect())
}

/// Flip `is_read` if the notification belongs to `user`.
pub async fn mark_read(
    pool: &PgPool,
    id: NotificationId,
    user: UserId,
) -> Result<Option<Notification>, StoreError> {
    let row = sqlx::query_as::<_, NotificationRow>(
        "UPDATE notifications SET is_read = TRUE
         WHERE id = $1 AND user_id = $2
         RETURNING id, user_id, message, paper_id, is_read, created_at",
    )
    .bind(id.0)
    .bind(user.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(NotificationRow::into_notification))
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    message: String,
    paper_id: Option<Uuid>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self) -> Notification {
        Notification {
            id: NotificationId(self.id),
            user_id: UserId(self.user_id),
            message: self.message,
            paper_id: self.paper_id.map(PaperId),
            is_read: self.is_read,
            created_at: Timestamp::from_utc(self.created_at),
        }
    }
}
