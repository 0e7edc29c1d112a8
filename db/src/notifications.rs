use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    pub link: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    #[tracing::instrument(skip(executor), err)]
    pub async fn create(
        executor: impl PgExecutor<'_>,
        user_id: i32,
        content: &str,
        link: &str,
    ) -> Result<Self> {
        let notification = sqlx::query_as::<_, Notification>(
            "
            INSERT INTO notifications (user_id, content, link)
            VALUES ($1, $2, $3)
            RETURNING
                id,
                user_id,
                content,
                link,
                is_read,
                created_at
            ",
        )
        .bind(user_id)
        .bind(content)
        .bind(link)
        .fetch_one(executor)
        .await?;

        Ok(notification)
    }

    pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let notification = sqlx::query_as::<_, Notification>(
            "
            SELECT
                id,
                user_id,
                content,
                link,
                is_read,
                created_at
            FROM notifications
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(notification)
    }

    /// Newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: i32,
        unread_only: bool,
    ) -> Result<Vec<Self>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "
            SELECT
                id,
                user_id,
                content,
                link,
                is_read,
                created_at
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn set_read(pool: &PgPool, id: i32, is_read: bool) -> Result<Option<Self>> {
        let notification = sqlx::query_as::<_, Notification>(
            "
            UPDATE notifications
            SET is_read = $2
            WHERE id = $1
            RETURNING
                id,
                user_id,
                content,
                link,
                is_read,
                created_at
            ",
        )
        .bind(id)
        .bind(is_read)
        .fetch_optional(pool)
        .await?;

        Ok(notification)
    }

    /// Returns how many notifications changed state.
    #[tracing::instrument(skip(pool), err)]
    pub async fn mark_all_read(pool: &PgPool, user_id: i32) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
