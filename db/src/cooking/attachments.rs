use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

/// An image owned either by a recipe (a thumbnail) or by one of its steps.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Attachment {
    pub id: i32,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// What API responses carry for an attachment; the bytes are served
/// separately from `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub id: i32,
    #[serde(skip)]
    pub recipe_id: Option<i32>,
    #[serde(skip)]
    pub step_id: Option<i32>,
    pub mime_type: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let attachment = sqlx::query_as::<_, Attachment>(
            "
            SELECT
                id,
                mime_type,
                data,
                created_at
            FROM attachments
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(attachment)
    }

    pub(crate) async fn insert_thumbnails(
        conn: &mut PgConnection,
        recipe_id: i32,
        images: &[NewAttachment],
    ) -> Result<()> {
        for image in images {
            sqlx::query(
                "
                INSERT INTO attachments (recipe_id, mime_type, data)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(recipe_id)
            .bind(&image.mime_type)
            .bind(&image.data)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub(crate) async fn insert_step_images(
        conn: &mut PgConnection,
        step_id: i32,
        images: &[NewAttachment],
    ) -> Result<()> {
        for image in images {
            sqlx::query(
                "
                INSERT INTO attachments (step_id, mime_type, data)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(step_id)
            .bind(&image.mime_type)
            .bind(&image.data)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

impl AttachmentMeta {
    pub(crate) async fn thumbnails_for_recipes(
        pool: &PgPool,
        recipe_ids: &[i32],
    ) -> Result<Vec<Self>> {
        let thumbnails = sqlx::query_as::<_, AttachmentMeta>(
            "
            SELECT
                id,
                recipe_id,
                step_id,
                mime_type,
                '/api/attachments/' || id AS url
            FROM attachments
            WHERE recipe_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(recipe_ids)
        .fetch_all(pool)
        .await?;

        Ok(thumbnails)
    }

    pub(crate) async fn for_steps(pool: &PgPool, step_ids: &[i32]) -> Result<Vec<Self>> {
        let images = sqlx::query_as::<_, AttachmentMeta>(
            "
            SELECT
                id,
                recipe_id,
                step_id,
                mime_type,
                '/api/attachments/' || id AS url
            FROM attachments
            WHERE step_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(step_ids)
        .fetch_all(pool)
        .await?;

        Ok(images)
    }

    /// Every attachment of a recipe: thumbnails first, then step images in
    /// step order.
    pub async fn all_for_recipe(pool: &PgPool, recipe_id: i32) -> Result<Vec<Self>> {
        let attachments = sqlx::query_as::<_, AttachmentMeta>(
            "
            SELECT
                a.id,
                a.recipe_id,
                a.step_id,
                a.mime_type,
                '/api/attachments/' || a.id AS url
            FROM attachments a
            LEFT JOIN recipe_steps s ON s.id = a.step_id
            WHERE a.recipe_id = $1 OR s.recipe_id = $1
            ORDER BY s.position NULLS FIRST, a.id
            ",
        )
        .bind(recipe_id)
        .fetch_all(pool)
        .await?;

        Ok(attachments)
    }
}
