use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    #[tracing::instrument(skip(pool), err)]
    pub async fn create(pool: &PgPool, name: String) -> Result<Self> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            INSERT INTO ingredients (name)
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

        Ok(ingredient)
    }

    pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            SELECT
                id,
                name,
                created_at,
                updated_at
            FROM ingredients
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(ingredient)
    }

    pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            SELECT
                id,
                name,
                created_at,
                updated_at
            FROM ingredients
            WHERE name = $1
            ",
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(ingredient)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "
            SELECT
                id,
                name,
                created_at,
                updated_at
            FROM ingredients
            ORDER BY name
            ",
        )
        .fetch_all(pool)
        .await?;

        Ok(ingredients)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn update(pool: &PgPool, id: i32, name: String) -> Result<Option<Self>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            UPDATE ingredients
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

        Ok(ingredient)
    }

    /// Fails with a foreign-key violation while a recipe still lists it.
    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns the ids in `ids` that have no ingredient row, in ascending order.
    pub async fn missing_ids(pool: &PgPool, ids: &[i32]) -> Result<Vec<i32>> {
        let missing = sqlx::query_scalar::<_, i32>(
            "
            SELECT requested.id
            FROM UNNEST($1::int4[]) AS requested(id)
            WHERE NOT EXISTS (
                SELECT 1 FROM ingredients i WHERE i.id = requested.id
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

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn names_are_unique(pool: PgPool) {
        Ingredient::create(&pool, "Tomato".to_string()).await.unwrap();

        let err = Ingredient::create(&pool, "Tomato".to_string())
            .await
            .unwrap_err();

        assert!(crate::is_unique_violation(&err));
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn missing_ids_reports_only_unknown_ids(pool: PgPool) {
        let tomato = Ingredient::create(&pool, "Tomato".to_string()).await.unwrap();
        let basil = Ingredient::create(&pool, "Basil".to_string()).await.unwrap();

        let missing = Ingredient::missing_ids(&pool, &[basil.id, 9_999, tomato.id, 777])
            .await
            .unwrap();

        assert_eq!(missing, vec![777, 9_999]);
    }
}
