use db::notifications::Notification;
use db::users::User;
use db::PgPool;
use serde::Deserialize;

use super::{not_found, required_text, ServiceResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationInput {
    pub user_id: Option<i32>,
    pub content: Option<String>,
    pub link: Option<String>,
}

#[tracing::instrument(skip(pool), err)]
pub(crate) async fn create(
    pool: &PgPool,
    input: CreateNotificationInput,
) -> ServiceResult<Notification> {
    let user_id = input
        .user_id
        .ok_or_else(|| super::validation("userId is required"))?;
    let content = required_text(input.content.as_deref(), "Content is required")?;
    let link = input.link.unwrap_or_default();

    if User::get_by_id(pool, user_id).await?.is_none() {
        return Err(not_found("User not found"));
    }

    Ok(Notification::create(pool, user_id, &content, link.trim()).await?)
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: i32,
    unread_only: bool,
) -> ServiceResult<Vec<Notification>> {
    if User::get_by_id(pool, user_id).await?.is_none() {
        return Err(not_found("User not found"));
    }

    Ok(Notification::list_for_user(pool, user_id, unread_only).await?)
}

pub(crate) async fn set_read(pool: &PgPool, id: i32, is_read: bool) -> ServiceResult<Notification> {
    Notification::set_read(pool, id, is_read)
        .await?
        .ok_or_else(|| not_found("Notification not found"))
}

pub(crate) async fn mark_all_read(pool: &PgPool, user_id: i32) -> ServiceResult<u64> {
    if User::get_by_id(pool, user_id).await?.is_none() {
        return Err(not_found("User not found"));
    }

    Ok(Notification::mark_all_read(pool, user_id).await?)
}

pub(crate) async fn delete(pool: &PgPool, id: i32) -> ServiceResult<()> {
    if Notification::delete(pool, id).await? {
        Ok(())
    } else {
        Err(not_found("Notification not found"))
    }
}
