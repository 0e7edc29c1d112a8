use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

/// The ingredient a recipe line points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRef {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i32,
    #[serde(skip)]
    pub recipe_id: i32,
    #[serde(rename = "order")]
    pub position: i32,
    pub quantity: f64,
    pub unit: String,
    pub ingredient: IngredientRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipeIngredient {
    pub ingredient_id: i32,
    pub position: i32,
    pub quantity: f64,
    pub unit: String,
}

#[derive(sqlx::FromRow)]
struct RecipeIngredientRow {
    id: i32,
    recipe_id: i32,
    position: i32,
    quantity: f64,
    unit: String,
    ingredient_id: i32,
    ingredient_name: String,
}

impl From<RecipeIngredientRow> for RecipeIngredient {
    fn from(row: RecipeIngredientRow) -> Self {
        Self {
            id: row.id,
            recipe_id: row.recipe_id,
            position: row.position,
            quantity: row.quantity,
            unit: row.unit,
            ingredient: IngredientRef {
                id: row.ingredient_id,
                name: row.ingredient_name,
            },
        }
    }
}

impl RecipeIngredient {
    /// `"{name} {quantity}{unit}"`, trimmed, e.g. `"Chicken 300g"`.
    pub fn label(&self) -> String {
        format!("{} {}{}", self.ingredient.name, self.quantity, self.unit)
            .trim()
            .to_string()
    }

    pub(crate) async fn replace_for_recipe(
        conn: &mut PgConnection,
        recipe_id: i32,
        lines: &[NewRecipeIngredient],
    ) -> Result<()> {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;

        for line in lines {
            sqlx::query(
                "
                INSERT INTO recipe_ingredients (recipe_id, ingredient_id, position, quantity, unit)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(recipe_id)
            .bind(line.ingredient_id)
            .bind(line.position)
            .bind(line.quantity)
            .bind(&line.unit)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Lines of every recipe in `recipe_ids`, grouped by recipe and in
    /// position order within each recipe.
    pub async fn for_recipes(pool: &PgPool, recipe_ids: &[i32]) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, RecipeIngredientRow>(
            "
            SELECT
                ri.id,
                ri.recipe_id,
                ri.position,
                ri.quantity,
                ri.unit,
                i.id AS ingredient_id,
                i.name AS ingredient_name
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ANY($1)
            ORDER BY ri.recipe_id, ri.position, ri.id
            ",
        )
        .bind(recipe_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, quantity: f64, unit: &str) -> RecipeIngredient {
        RecipeIngredient {
            id: 1,
            recipe_id: 1,
            position: 1,
            quantity,
            unit: unit.to_string(),
            ingredient: IngredientRef {
                id: 1,
                name: name.to_string(),
            },
        }
    }

    #[test]
    fn label_joins_quantity_and_unit() {
        assert_eq!(line("Chicken", 300.0, "g").label(), "Chicken 300g");
        assert_eq!(line("Fish sauce", 1.5, " tbsp").label(), "Fish sauce 1.5 tbsp");
    }

    #[test]
    fn label_trims_an_empty_unit() {
        assert_eq!(line("Egg", 2.0, "").label(), "Egg 2");
    }
}
