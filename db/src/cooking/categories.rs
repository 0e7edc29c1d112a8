use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    #[tracing::instrument(skip(pool), err)]
    pub async fn create(pool: &PgPool, name: String) -> Result<Self> {
        let category = sqlx::query_as::<_, Category>(
            "
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING
                id,
                name,
                created_at,
                updated_at
            ",
        )
        .bind(name)
        .fetch_one(pool)
        .await?;

        Ok(category)
    }

    pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Category>(
            "
            SELECT
                id,
                name,
                created_at,
                updated_at
            FROM categories
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(category)
    }

    pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Category>(
            "
            SELECT
                id,
                name,
                created_at,
                updated_at
            FROM categories
            WHERE name = $1
            ",
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(category)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let categories = sqlx::query_as::<_, Category>(
            "
            SELECT
                id,
                name,
                created_at,
                updated_at
            FROM categories
            ORDER BY name
            ",
        )
        .fetch_all(pool)
        .await?;

        Ok(categories)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn update(pool: &PgPool, id: i32, name: String) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Category>(
            "
            UPDATE categories
            SET name = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING
                id,
                name,
                created_at,
                updated_at
            ",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(category)
    }

    /// Recipes lose the link to a deleted category but are otherwise kept.
    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns the ids in `ids` that have no category row, in ascending order.
    pub async fn missing_ids(pool: &PgPool, ids: &[i32]) -> Result<Vec<i32>> {
        let missing = sqlx::query_scalar::<_, i32>(
            "
            SELECT requested.id
            FROM UNNEST($1::int4[]) AS requested(id)
            WHERE NOT EXISTS (
                SELECT 1 FROM categories c WHERE c.id = requested.id
            )
            ORDER BY requested.id
            ",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(missing)
    }
}
