use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Area {
    #[tracing::instrument(skip(pool), err)]
    pub async fn create(pool: &PgPool, name: String, is_active: bool) -> Result<Self> {
        let area = sqlx::query_as::<_, Area>(
            "
            INSERT INTO areas (name, is_active)
            VALUES ($1, $2)
            RETURNING
                id,
                name,
                is_active,
                created_at,
                updated_at
            ",
        )
        .bind(name)
        .bind(is_active)
        .fetch_one(pool)
        .await?;

        Ok(area)
    }

    pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let area = sqlx::query_as::<_, Area>(
            "
            SELECT
                id,
                name,
                is_active,
                created_at,
                updated_at
            FROM areas
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(area)
    }

    pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>> {
        let area = sqlx::query_as::<_, Area>(
            "
            SELECT
                id,
                name,
                is_active,
                created_at,
                updated_at
            FROM areas
            WHERE name = $1
            ",
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(area)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let areas = sqlx::query_as::<_, Area>(
            "
            SELECT
                id,
                name,
                is_active,
                created_at,
                updated_at
            FROM areas
            ORDER BY name
            ",
        )
        .fetch_all(pool)
        .await?;

        Ok(areas)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn update(
        pool: &PgPool,
        id: i32,
        name: Option<String>,
        is_active: Option<bool>,
    ) -> Result<Option<Self>> {
        let area = sqlx::query_as::<_, Area>(
            "
            UPDATE areas
            SET name = COALESCE($2, name),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING
                id,
                name,
                is_active,
                created_at,
                updated_at
            ",
        )
        .bind(id)
        .bind(name)
        .bind(is_active)
        .fetch_optional(pool)
        .await?;

        Ok(area)
    }

    /// Fails with a foreign-key violation while recipes still use the area.
    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM areas WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
