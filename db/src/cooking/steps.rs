use color_eyre::Result;
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use super::attachments::{Attachment, AttachmentMeta, NewAttachment};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecipeStep {
    pub id: i32,
    #[serde(rename = "order")]
    pub position: i32,
    pub description: String,
    #[sqlx(skip)]
    pub attachments: Vec<AttachmentMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStep {
    pub position: i32,
    pub description: String,
    pub images: Vec<NewAttachment>,
}

impl RecipeStep {
    /// Replaces every step of the recipe. Images of the old steps go with
    /// them through the `step_id` cascade.
    pub(crate) async fn replace_for_recipe(
        conn: &mut PgConnection,
        recipe_id: i32,
        steps: &[NewStep],
    ) -> Result<()> {
        sqlx::query("DELETE FROM recipe_steps WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;

        for step in steps {
            let step_id = sqlx::query_scalar::<_, i32>(
                "
                INSERT INTO recipe_steps (recipe_id, position, description)
                VALUES ($1, $2, $3)
                RETURNING id
                ",
            )
            .bind(recipe_id)
            .bind(step.position)
            .bind(&step.description)
            .fetch_one(&mut *conn)
            .await?;

            Attachment::insert_step_images(conn, step_id, &step.images).await?;
        }

        Ok(())
    }

    pub async fn get_by_recipe(pool: &PgPool, recipe_id: i32) -> Result<Vec<Self>> {
        let mut steps = sqlx::query_as::<_, RecipeStep>(
            "
            SELECT
                id,
                position,
                description
            FROM recipe_steps
            WHERE recipe_id = $1
            ORDER BY position, id
            ",
        )
        .bind(recipe_id)
        .fetch_all(pool)
        .await?;

        let step_ids = steps.iter().map(|s| s.id).collect::<Vec<_>>();
        let mut images = AttachmentMeta::for_steps(pool, &step_ids)
            .await?
            .into_iter()
            .into_group_map_by(|a| a.step_id);

        for step in &mut steps {
            step.attachments = images.remove(&Some(step.id)).unwrap_or_default();
        }

        Ok(steps)
    }
}
