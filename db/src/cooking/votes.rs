use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// A user liking a recipe. At most one per user and recipe.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: i32,
    pub user_id: i32,
    pub recipe_id: i32,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    /// Fails with a unique violation when the user already voted.
    #[tracing::instrument(skip(executor), err)]
    pub async fn create(
        executor: impl PgExecutor<'_>,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<Self> {
        let vote = sqlx::query_as::<_, Vote>(
            "
            INSERT INTO votes (user_id, recipe_id)
            VALUES ($1, $2)
            RETURNING
                id,
                user_id,
                recipe_id,
                created_at
            ",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(executor)
        .await?;

        Ok(vote)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &PgPool, user_id: i32, recipe_id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM votes WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(pool: &PgPool, user_id: i32, recipe_id: i32) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM votes WHERE user_id = $1 AND recipe_id = $2)",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}
