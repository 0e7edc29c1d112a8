//! Areas, categories and ingredients: named lookup rows with unique names.

use db::cooking::{Area, Category, Ingredient};
use db::PgPool;
use serde::Deserialize;

use super::{conflict, conflict_on_violation, not_found, required_text, ServiceResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameInput {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaInput {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

const NAME_REQUIRED: &str = "Name is required";

/// Whether the row already holding a name is a different one than `id`.
fn taken_by_other(existing_id: Option<i32>, id: Option<i32>) -> bool {
    match (existing_id, id) {
        (Some(existing), Some(id)) => existing != id,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

pub(crate) mod ingredients {
    use super::*;

    const TAKEN: &str = "Ingredient name already exists";

    #[tracing::instrument(skip(pool), err)]
    pub(crate) async fn create(pool: &PgPool, input: NameInput) -> ServiceResult<Ingredient> {
        let name = required_text(input.name.as_deref(), NAME_REQUIRED)?;

        let existing = Ingredient::get_by_name(pool, &name).await?;
        if taken_by_other(existing.map(|i| i.id), None) {
            return Err(conflict(TAKEN));
        }

        Ingredient::create(pool, name)
            .await
            .map_err(|err| conflict_on_violation(err, TAKEN))
    }

    #[tracing::instrument(skip(pool), err)]
    pub(crate) async fn update(
        pool: &PgPool,
        id: i32,
        input: NameInput,
    ) -> ServiceResult<Ingredient> {
        let name = required_text(input.name.as_deref(), NAME_REQUIRED)?;

        let existing = Ingredient::get_by_name(pool, &name).await?;
        if taken_by_other(existing.map(|i| i.id), Some(id)) {
            return Err(conflict(TAKEN));
        }

        Ingredient::update(pool, id, name)
            .await
            .map_err(|err| conflict_on_violation(err, TAKEN))?
            .ok_or_else(|| not_found("Ingredient not found"))
    }

    #[tracing::instrument(skip(pool), err)]
    pub(crate) async fn delete(pool: &PgPool, id: i32) -> ServiceResult<()> {
        let deleted = Ingredient::delete(pool, id)
            .await
            .map_err(|err| conflict_on_violation(err, "Ingredient is used by a recipe"))?;

        if deleted {
            Ok(())
        } else {
            Err(not_found("Ingredient not found"))
        }
    }
}

pub(crate) mod categories {
    use super::*;

    const TAKEN: &str = "Category name already exists";

    #[tracing::instrument(skip(pool), err)]
    pub(crate) async fn create(pool: &PgPool, input: NameInput) -> ServiceResult<Category> {
        let name = required_text(input.name.as_deref(), NAME_REQUIRED)?;

        let existing = Category::get_by_name(pool, &name).await?;
        if taken_by_other(existing.map(|c| c.id), None) {
            return Err(conflict(TAKEN));
        }

        Category::create(pool, name)
            .await
            .map_err(|err| conflict_on_violation(err, TAKEN))
    }

    #[tracing::instrument(skip(pool), err)]
    pub(crate) async fn update(pool: &PgPool, id: i32, input: NameInput) -> ServiceResult<Category> {
        let name = required_text(input.name.as_deref(), NAME_REQUIRED)?;

        let existing = Category::get_by_name(pool, &name).await?;
        if taken_by_other(existing.map(|c| c.id), Some(id)) {
            return Err(conflict(TAKEN));
        }

        Category::update(pool, id, name)
            .await
            .map_err(|err| conflict_on_violation(err, TAKEN))?
            .ok_or_else(|| not_found("Category not found"))
    }

    /// Recipes lose the category link; they are not deleted.
    #[tracing::instrument(skip(pool), err)]
    pub(crate) async fn delete(pool: &PgPool, id: i32) -> ServiceResult<()> {
        if Category::delete(pool, id).await? {
            Ok(())
        } else {
            Err(not_found("Category not found"))
        }
    }
}

pub(crate) mod areas {
    use super::*;

    const TAKEN: &str = "Area name already exists";

    #[tracing::instrument(skip(pool), err)]
    pub(crate) async fn create(pool: &PgPool, input: AreaInput) -> ServiceResult<Area> {
        let name = required_text(input.name.as_deref(), NAME_REQUIRED)?;

        let existing = Area::get_by_name(pool, &name).await?;
        if taken_by_other(existing.map(|a| a.id), None) {
            return Err(conflict(TAKEN));
        }

        Area::create(pool, name, input.is_active.unwrap_or(true))
            .await
            .map_err(|err| conflict_on_violation(err, TAKEN))
    }

    #[tracing::instrument(skip(pool), err)]
    pub(crate) async fn update(pool: &PgPool, id: i32, input: AreaInput) -> ServiceResult<Area> {
        let name = input
            .name
            .as_deref()
            .map(|n| required_text(Some(n), NAME_REQUIRED))
            .transpose()?;

        if let Some(name) = &name {
            let existing = Area::get_by_name(pool, name).await?;
            if taken_by_other(existing.map(|a| a.id), Some(id)) {
                return Err(conflict(TAKEN));
            }
        }

        Area::update(pool, id, name, input.is_active)
            .await
            .map_err(|err| conflict_on_violation(err, TAKEN))?
            .ok_or_else(|| not_found("Area not found"))
    }

    #[tracing::instrument(skip(pool), err)]
    pub(crate) async fn delete(pool: &PgPool, id: i32) -> ServiceResult<()> {
        let deleted = Area::delete(pool, id)
            .await
            .map_err(|err| conflict_on_violation(err, "Area is used by a recipe"))?;

        if deleted {
            Ok(())
        } else {
            Err(not_found("Area not found"))
        }
    }
}
