use chrono::{DateTime, Utc};
use color_eyre::Result;
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use super::attachments::{Attachment, AttachmentMeta, NewAttachment};
use super::recipe_ingredients::{NewRecipeIngredient, RecipeIngredient};
use super::steps::{NewStep, RecipeStep};

/// `id` and `name` of a related row, which is all a recipe payload shows of
/// its author, area and categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NamedRef {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub user: NamedRef,
    pub area: NamedRef,
    pub categories: Vec<NamedRef>,
    pub thumbnails: Vec<AttachmentMeta>,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetails {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub user: NamedRef,
    pub area: NamedRef,
    pub categories: Vec<NamedRef>,
    pub thumbnails: Vec<AttachmentMeta>,
    pub steps: Vec<RecipeStep>,
    pub recipe_ingredients: Vec<RecipeIngredient>,
    pub voted_user_ids: Vec<i32>,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recipe with all of its children, as validated by the service layer.
/// Positions in `steps` and `ingredients` are already dense.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub description: String,
    pub user_id: i32,
    pub area_id: i32,
    pub category_ids: Vec<i32>,
    pub thumbnails: Vec<NewAttachment>,
    pub steps: Vec<NewStep>,
    pub ingredients: Vec<NewRecipeIngredient>,
}

/// A partial update. Scalars are merged; a `Some` collection replaces the
/// stored one wholesale.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub area_id: Option<i32>,
    pub category_ids: Option<Vec<i32>>,
    pub thumbnails: Option<Vec<NewAttachment>>,
    pub steps: Option<Vec<NewStep>>,
    pub ingredients: Option<Vec<NewRecipeIngredient>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RecipeRow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub user_id: i32,
    pub user_name: String,
    pub area_id: i32,
    pub area_name: String,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) const RECIPE_ROW_SELECT: &str = "
    SELECT
        r.id,
        r.name,
        r.description,
        r.user_id,
        u.name AS user_name,
        r.area_id,
        a.name AS area_name,
        (SELECT COUNT(*) FROM votes v WHERE v.recipe_id = r.id) AS vote_count,
        r.created_at,
        r.updated_at
    FROM recipes r
    JOIN users u ON u.id = r.user_id
    JOIN areas a ON a.id = r.area_id
";

#[derive(sqlx::FromRow)]
struct CategoryLink {
    recipe_id: i32,
    id: i32,
    name: String,
}

pub struct Recipe;

impl Recipe {
    #[tracing::instrument(skip_all, fields(name = %recipe.name, user_id = recipe.user_id), err)]
    pub async fn create_with_details(pool: &PgPool, recipe: NewRecipe) -> Result<i32> {
        let mut transaction = pool.begin().await?;

        let recipe_id = sqlx::query_scalar::<_, i32>(
            "
            INSERT INTO recipes (name, description, user_id, area_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&recipe.name)
        .bind(&recipe.description)
        .bind(recipe.user_id)
        .bind(recipe.area_id)
        .fetch_one(&mut *transaction)
        .await?;

        link_categories(&mut transaction, recipe_id, &recipe.category_ids).await?;
        Attachment::insert_thumbnails(&mut transaction, recipe_id, &recipe.thumbnails).await?;
        RecipeStep::replace_for_recipe(&mut transaction, recipe_id, &recipe.steps).await?;
        RecipeIngredient::replace_for_recipe(&mut transaction, recipe_id, &recipe.ingredients)
            .await?;

        transaction.commit().await?;

        tracing::info!(recipe_id, "Created recipe");

        Ok(recipe_id)
    }

    /// Returns `false` when there is no recipe with this id.
    #[tracing::instrument(skip(pool, changes), err)]
    pub async fn update_with_details(
        pool: &PgPool,
        recipe_id: i32,
        changes: RecipeChanges,
    ) -> Result<bool> {
        let mut transaction = pool.begin().await?;

        let updated = sqlx::query(
            "
            UPDATE recipes
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                area_id = COALESCE($4, area_id),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(recipe_id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.area_id)
        .execute(&mut *transaction)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        if let Some(category_ids) = changes.category_ids {
            sqlx::query("DELETE FROM recipe_categories WHERE recipe_id = $1")
                .bind(recipe_id)
                .execute(&mut *transaction)
                .await?;
            link_categories(&mut transaction, recipe_id, &category_ids).await?;
        }

        if let Some(thumbnails) = changes.thumbnails {
            sqlx::query("DELETE FROM attachments WHERE recipe_id = $1")
                .bind(recipe_id)
                .execute(&mut *transaction)
                .await?;
            Attachment::insert_thumbnails(&mut transaction, recipe_id, &thumbnails).await?;
        }

        if let Some(steps) = changes.steps {
            RecipeStep::replace_for_recipe(&mut transaction, recipe_id, &steps).await?;
        }

        if let Some(ingredients) = changes.ingredients {
            RecipeIngredient::replace_for_recipe(&mut transaction, recipe_id, &ingredients)
                .await?;
        }

        transaction.commit().await?;

        Ok(true)
    }

    /// Removes the recipe; thumbnails, steps, step images, ingredient lines,
    /// category links and votes go with it.
    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &PgPool, recipe_id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(pool: &PgPool, recipe_id: i32) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM recipes WHERE id = $1)",
        )
        .bind(recipe_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Owner and name, for building notifications.
    pub async fn owner(pool: &PgPool, recipe_id: i32) -> Result<Option<(i32, String)>> {
        let owner = sqlx::query_as::<_, (i32, String)>(
            "SELECT user_id, name FROM recipes WHERE id = $1",
        )
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;

        Ok(owner)
    }

    pub async fn get_details(pool: &PgPool, recipe_id: i32) -> Result<Option<RecipeDetails>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!("{RECIPE_ROW_SELECT} WHERE r.id = $1"))
            .bind(recipe_id)
            .fetch_optional(pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let ids = [row.id];
        let categories = categories_for(pool, &ids)
            .await?
            .into_iter()
            .map(|link| NamedRef {
                id: link.id,
                name: link.name,
            })
            .collect();
        let thumbnails = AttachmentMeta::thumbnails_for_recipes(pool, &ids).await?;
        let steps = RecipeStep::get_by_recipe(pool, row.id).await?;
        let recipe_ingredients = RecipeIngredient::for_recipes(pool, &ids).await?;
        let voted_user_ids = sqlx::query_scalar::<_, i32>(
            "SELECT user_id FROM votes WHERE recipe_id = $1 ORDER BY created_at, id",
        )
        .bind(row.id)
        .fetch_all(pool)
        .await?;

        Ok(Some(RecipeDetails {
            id: row.id,
            name: row.name,
            description: row.description,
            user: NamedRef {
                id: row.user_id,
                name: row.user_name,
            },
            area: NamedRef {
                id: row.area_id,
                name: row.area_name,
            },
            categories,
            thumbnails,
            steps,
            recipe_ingredients,
            voted_user_ids,
            vote_count: row.vote_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<RecipeSummary>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "{RECIPE_ROW_SELECT} ORDER BY r.created_at DESC, r.id DESC"
        ))
        .fetch_all(pool)
        .await?;

        summarize(pool, rows).await
    }

    pub async fn newest(pool: &PgPool, limit: i64) -> Result<Vec<RecipeSummary>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "{RECIPE_ROW_SELECT} ORDER BY r.created_at DESC, r.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        summarize(pool, rows).await
    }

    /// Ordered by votes cast at or after `since`, then by all-time votes,
    /// then newest first.
    pub async fn top_voted_since(
        pool: &PgPool,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RecipeSummary>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "
            {RECIPE_ROW_SELECT}
            ORDER BY
                (SELECT COUNT(*) FROM votes v WHERE v.recipe_id = r.id AND v.created_at >= $1) DESC,
                vote_count DESC,
                r.created_at DESC,
                r.id DESC
            LIMIT $2
            "
        ))
        .bind(since)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        summarize(pool, rows).await
    }

    pub async fn random(pool: &PgPool, limit: i64) -> Result<Vec<RecipeSummary>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "{RECIPE_ROW_SELECT} ORDER BY random() LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        summarize(pool, rows).await
    }
}

async fn link_categories(
    conn: &mut PgConnection,
    recipe_id: i32,
    category_ids: &[i32],
) -> Result<()> {
    sqlx::query(
        "
        INSERT INTO recipe_categories (recipe_id, category_id)
        SELECT $1, UNNEST($2::int4[])
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(recipe_id)
    .bind(category_ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn categories_for(pool: &PgPool, recipe_ids: &[i32]) -> Result<Vec<CategoryLink>> {
    let links = sqlx::query_as::<_, CategoryLink>(
        "
        SELECT
            rc.recipe_id,
            c.id,
            c.name
        FROM recipe_categories rc
        JOIN categories c ON c.id = rc.category_id
        WHERE rc.recipe_id = ANY($1)
        ORDER BY c.name
        ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await?;

    Ok(links)
}

/// Loads categories and thumbnails for a batch of rows in two queries,
/// keeping the order of `rows`.
pub(crate) async fn summarize(pool: &PgPool, rows: Vec<RecipeRow>) -> Result<Vec<RecipeSummary>> {
    let ids = rows.iter().map(|r| r.id).collect::<Vec<_>>();

    let mut categories = categories_for(pool, &ids)
        .await?
        .into_iter()
        .into_group_map_by(|link| link.recipe_id);
    let mut thumbnails = AttachmentMeta::thumbnails_for_recipes(pool, &ids)
        .await?
        .into_iter()
        .into_group_map_by(|a| a.recipe_id);

    let summaries = rows
        .into_iter()
        .map(|row| RecipeSummary {
            categories: categories
                .remove(&row.id)
                .unwrap_or_default()
                .into_iter()
                .map(|link| NamedRef {
                    id: link.id,
                    name: link.name,
                })
                .collect(),
            thumbnails: thumbnails.remove(&Some(row.id)).unwrap_or_default(),
            id: row.id,
            name: row.name,
            description: row.description,
            user: NamedRef {
                id: row.user_id,
                name: row.user_name,
            },
            area: NamedRef {
                id: row.area_id,
                name: row.area_name,
            },
            vote_count: row.vote_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect();

    Ok(summaries)
}
