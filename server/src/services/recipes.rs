use db::cooking::{
    Area, Category, Ingredient, NewRecipe, NewRecipeIngredient, NewStep, Recipe, RecipeChanges,
    RecipeDetails,
};
use db::users::User;
use db::PgPool;
use itertools::Itertools as _;
use serde::Deserialize;

use super::images::{decode_all, ImageUpload};
use super::{
    conflict_on_violation, join_ids, not_found, required_text, validation, ServiceError,
    ServiceResult,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    pub order: Option<i32>,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageUpload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientLineInput {
    pub ingredient_id: Option<i32>,
    pub order: Option<i32>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub user_id: Option<i32>,
    pub area_id: Option<i32>,
    pub category_ids: Option<Vec<i32>>,
    #[serde(default)]
    pub thumbnail_images: Vec<ImageUpload>,
    #[serde(default)]
    pub steps: Vec<StepInput>,
    #[serde(default)]
    pub recipe_ingredients: Vec<IngredientLineInput>,
}

/// Absent fields are left alone. Present collections replace the stored
/// ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub area_id: Option<i32>,
    pub category_ids: Option<Vec<i32>>,
    pub thumbnail_images: Option<Vec<ImageUpload>>,
    pub steps: Option<Vec<StepInput>>,
    pub recipe_ingredients: Option<Vec<IngredientLineInput>>,
}

/// Gives every item the position it asked for, or its 1-based index, then
/// renumbers densely from 1 keeping that order. Ties keep input order.
pub(crate) fn normalize_positions<T>(items: Vec<(Option<i32>, T)>) -> Vec<(i32, T)> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, (order, item))| {
            let fallback = i32::try_from(index + 1).unwrap_or(i32::MAX);
            (order.unwrap_or(fallback), item)
        })
        .sorted_by_key(|(key, _)| *key)
        .zip(1..)
        .map(|((_, item), position)| (position, item))
        .collect()
}

fn category_ids(ids: Option<Vec<i32>>) -> ServiceResult<Vec<i32>> {
    let ids = ids.unwrap_or_default().into_iter().unique().collect::<Vec<_>>();
    if ids.is_empty() {
        return Err(validation("At least one category is required"));
    }

    Ok(ids)
}

fn steps(inputs: Vec<StepInput>, max_image_bytes: usize) -> ServiceResult<Vec<NewStep>> {
    let mut prepared = Vec::with_capacity(inputs.len());
    for input in inputs {
        let description = required_text(
            input.description.as_deref(),
            "Step description is required",
        )?;
        let images = decode_all(&input.images, max_image_bytes)?;
        prepared.push((input.order, (description, images)));
    }

    Ok(normalize_positions(prepared)
        .into_iter()
        .map(|(position, (description, images))| NewStep {
            position,
            description,
            images,
        })
        .collect())
}

fn ingredient_lines(inputs: Vec<IngredientLineInput>) -> ServiceResult<Vec<NewRecipeIngredient>> {
    let mut prepared = Vec::with_capacity(inputs.len());
    for input in inputs {
        let ingredient_id = input
            .ingredient_id
            .ok_or_else(|| validation("Each recipe ingredient needs an ingredientId"))?;
        let quantity = input
            .quantity
            .filter(|q| q.is_finite() && *q >= 0.0)
            .ok_or_else(|| validation("Ingredient quantity must be a non-negative number"))?;
        let unit = required_text(input.unit.as_deref(), "Ingredient unit is required")?;
        prepared.push((input.order, (ingredient_id, quantity, unit)));
    }

    Ok(normalize_positions(prepared)
        .into_iter()
        .map(
            |(position, (ingredient_id, quantity, unit))| NewRecipeIngredient {
                ingredient_id,
                position,
                quantity,
                unit,
            },
        )
        .collect())
}

/// Everything about a new recipe that can be checked without the database.
pub(crate) fn prepare_new(
    input: CreateRecipeInput,
    max_image_bytes: usize,
) -> ServiceResult<NewRecipe> {
    const REQUIRED: &str = "Name, description, and areaId are required";

    let name = required_text(input.name.as_deref(), REQUIRED)?;
    let description = required_text(input.description.as_deref(), REQUIRED)?;
    let area_id = input.area_id.ok_or_else(|| validation(REQUIRED))?;
    let user_id = input.user_id.ok_or_else(|| validation("userId is required"))?;

    Ok(NewRecipe {
        name,
        description,
        user_id,
        area_id,
        category_ids: category_ids(input.category_ids)?,
        thumbnails: decode_all(&input.thumbnail_images, max_image_bytes)?,
        steps: steps(input.steps, max_image_bytes)?,
        ingredients: ingredient_lines(input.recipe_ingredients)?,
    })
}

pub(crate) fn prepare_changes(
    input: UpdateRecipeInput,
    max_image_bytes: usize,
) -> ServiceResult<RecipeChanges> {
    let name = input
        .name
        .map(|n| required_text(Some(&n), "Name cannot be empty"))
        .transpose()?;
    let description = input
        .description
        .map(|d| required_text(Some(&d), "Description cannot be empty"))
        .transpose()?;

    Ok(RecipeChanges {
        name,
        description,
        area_id: input.area_id,
        category_ids: input
            .category_ids
            .map(|ids| category_ids(Some(ids)))
            .transpose()?,
        thumbnails: input
            .thumbnail_images
            .map(|images| decode_all(&images, max_image_bytes))
            .transpose()?,
        steps: input
            .steps
            .map(|s| steps(s, max_image_bytes))
            .transpose()?,
        ingredients: input.recipe_ingredients.map(ingredient_lines).transpose()?,
    })
}

/// Referenced rows that must exist before a write.
#[derive(Debug, Default)]
struct References<'a> {
    user_id: Option<i32>,
    area_id: Option<i32>,
    category_ids: &'a [i32],
    ingredient_ids: Vec<i32>,
}

async fn check_references(pool: &PgPool, refs: References<'_>) -> ServiceResult<()> {
    if let Some(user_id) = refs.user_id {
        if User::get_by_id(pool, user_id).await?.is_none() {
            return Err(validation("User not found"));
        }
    }

    if let Some(area_id) = refs.area_id {
        if Area::get_by_id(pool, area_id).await?.is_none() {
            return Err(validation("Area not found"));
        }
    }

    if !refs.category_ids.is_empty() {
        let missing = Category::missing_ids(pool, refs.category_ids).await?;
        if !missing.is_empty() {
            return Err(validation(format!(
                "Categories not found: {}",
                join_ids(&missing)
            )));
        }
    }

    let ingredient_ids = refs.ingredient_ids.into_iter().unique().collect::<Vec<_>>();
    if !ingredient_ids.is_empty() {
        let missing = Ingredient::missing_ids(pool, &ingredient_ids).await?;
        if !missing.is_empty() {
            return Err(validation(format!(
                "Ingredients not found: {}",
                join_ids(&missing)
            )));
        }
    }

    Ok(())
}

pub(crate) async fn details(pool: &PgPool, recipe_id: i32) -> ServiceResult<RecipeDetails> {
    Recipe::get_details(pool, recipe_id)
        .await?
        .ok_or_else(|| not_found("Recipe not found"))
}

#[tracing::instrument(skip(pool, input), err)]
pub(crate) async fn create(
    pool: &PgPool,
    input: CreateRecipeInput,
    max_image_bytes: usize,
) -> ServiceResult<RecipeDetails> {
    let recipe = prepare_new(input, max_image_bytes)?;

    check_references(
        pool,
        References {
            user_id: Some(recipe.user_id),
            area_id: Some(recipe.area_id),
            category_ids: &recipe.category_ids,
            ingredient_ids: recipe.ingredients.iter().map(|i| i.ingredient_id).collect(),
        },
    )
    .await?;

    let recipe_id = Recipe::create_with_details(pool, recipe)
        .await
        .map_err(|err| conflict_on_violation(err, "A referenced record no longer exists"))?;

    details(pool, recipe_id).await
}

#[tracing::instrument(skip(pool, input), err)]
pub(crate) async fn update(
    pool: &PgPool,
    recipe_id: i32,
    input: UpdateRecipeInput,
    max_image_bytes: usize,
) -> ServiceResult<RecipeDetails> {
    let changes = prepare_changes(input, max_image_bytes)?;

    if !Recipe::exists(pool, recipe_id).await? {
        return Err(not_found("Recipe not found"));
    }

    check_references(
        pool,
        References {
            user_id: None,
            area_id: changes.area_id,
            category_ids: changes.category_ids.as_deref().unwrap_or_default(),
            ingredient_ids: changes
                .ingredients
                .iter()
                .flatten()
                .map(|i| i.ingredient_id)
                .collect(),
        },
    )
    .await?;

    let found = Recipe::update_with_details(pool, recipe_id, changes)
        .await
        .map_err(|err| conflict_on_violation(err, "A referenced record no longer exists"))?;
    if !found {
        return Err(not_found("Recipe not found"));
    }

    details(pool, recipe_id).await
}

#[tracing::instrument(skip(pool), err)]
pub(crate) async fn delete(pool: &PgPool, recipe_id: i32) -> ServiceResult<()> {
    if Recipe::delete(pool, recipe_id).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound("Recipe not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CreateRecipeInput {
        CreateRecipeInput {
            name: Some(" Bún chả ".to_string()),
            description: Some("Grilled pork with noodles".to_string()),
            user_id: Some(1),
            area_id: Some(2),
            category_ids: Some(vec![3, 3, 4]),
            ..Default::default()
        }
    }

    fn step(order: Option<i32>, description: &str) -> StepInput {
        StepInput {
            order,
            description: Some(description.to_string()),
            images: vec![],
        }
    }

    #[test]
    fn positions_follow_requested_order_then_become_dense() {
        let items = vec![(Some(10), "c"), (None, "a"), (Some(5), "b"), (Some(5), "b2")];

        assert_eq!(
            normalize_positions(items),
            vec![(1, "a"), (2, "b"), (3, "b2"), (4, "c")]
        );
    }

    #[test]
    fn missing_orders_use_the_array_index() {
        let items = vec![(None, "first"), (None, "second"), (None, "third")];

        assert_eq!(
            normalize_positions(items),
            vec![(1, "first"), (2, "second"), (3, "third")]
        );
    }

    #[test]
    fn prepare_new_trims_dedupes_and_orders() {
        let recipe = prepare_new(
            CreateRecipeInput {
                steps: vec![step(Some(2), "Grill"), step(Some(1), "Marinate")],
                recipe_ingredients: vec![IngredientLineInput {
                    ingredient_id: Some(8),
                    order: None,
                    quantity: Some(500.0),
                    unit: Some("g".to_string()),
                }],
                ..valid_input()
            },
            1024,
        )
        .unwrap();

        assert_eq!(recipe.name, "Bún chả");
        assert_eq!(recipe.category_ids, vec![3, 4]);
        assert_eq!(
            recipe
                .steps
                .iter()
                .map(|s| (s.position, s.description.as_str()))
                .collect::<Vec<_>>(),
            vec![(1, "Marinate"), (2, "Grill")]
        );
        assert_eq!(recipe.ingredients[0].position, 1);
    }

    #[test]
    fn prepare_new_requires_the_basics() {
        let missing_area = prepare_new(
            CreateRecipeInput {
                area_id: None,
                ..valid_input()
            },
            1024,
        );
        assert!(matches!(
            missing_area,
            Err(ServiceError::Validation(m)) if m == "Name, description, and areaId are required"
        ));

        let no_categories = prepare_new(
            CreateRecipeInput {
                category_ids: Some(vec![]),
                ..valid_input()
            },
            1024,
        );
        assert!(matches!(
            no_categories,
            Err(ServiceError::Validation(m)) if m == "At least one category is required"
        ));

        let blank_step = prepare_new(
            CreateRecipeInput {
                steps: vec![step(None, "  ")],
                ..valid_input()
            },
            1024,
        );
        assert!(matches!(blank_step, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn negative_or_missing_quantities_are_rejected() {
        for quantity in [Some(-1.0), Some(f64::NAN), None] {
            let result = prepare_new(
                CreateRecipeInput {
                    recipe_ingredients: vec![IngredientLineInput {
                        ingredient_id: Some(1),
                        order: None,
                        quantity,
                        unit: Some("g".to_string()),
                    }],
                    ..valid_input()
                },
                1024,
            );

            assert!(matches!(result, Err(ServiceError::Validation(_))));
        }
    }

    #[test]
    fn changes_only_carry_what_was_sent() {
        let changes = prepare_changes(
            UpdateRecipeInput {
                description: Some("New description".to_string()),
                steps: Some(vec![]),
                ..Default::default()
            },
            1024,
        )
        .unwrap();

        assert_eq!(changes.name, None);
        assert_eq!(changes.description.as_deref(), Some("New description"));
        assert_eq!(changes.category_ids, None);
        assert_eq!(changes.thumbnails, None);
        assert_eq!(changes.steps, Some(vec![]));
    }

    #[test]
    fn changes_reject_empty_categories_and_blank_names() {
        let empty_categories = prepare_changes(
            UpdateRecipeInput {
                category_ids: Some(vec![]),
                ..Default::default()
            },
            1024,
        );
        assert!(matches!(empty_categories, Err(ServiceError::Validation(_))));

        let blank_name = prepare_changes(
            UpdateRecipeInput {
                name: Some(" ".to_string()),
                ..Default::default()
            },
            1024,
        );
        assert!(matches!(blank_name, Err(ServiceError::Validation(_))));
    }
}
