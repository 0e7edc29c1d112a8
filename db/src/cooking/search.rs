use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::recipe::{summarize, Recipe, RecipeRow, RecipeSummary, RECIPE_ROW_SELECT};
use crate::Page;

/// Filters are ANDed together; empty values are ignored.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Substring of the recipe name or description.
    pub keyword: Option<String>,
    /// Matches recipes containing any of these ingredients (substring).
    pub ingredient_names: Vec<String>,
    /// Substring of the area name.
    pub area_name: Option<String>,
    pub area_ids: Vec<i32>,
    pub category_ids: Vec<i32>,
    pub user_id: Option<i32>,
    pub voted_by: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePage {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Wraps user input in `%...%` for `ILIKE`, escaping the wildcard characters
/// it may contain.
pub fn like_pattern(input: &str) -> String {
    let mut pattern = String::with_capacity(input.len() + 2);
    pattern.push('%');
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &RecipeFilter) {
    query.push(" WHERE TRUE");

    if let Some(keyword) = non_blank(filter.keyword.as_deref()) {
        let pattern = like_pattern(keyword);
        query
            .push(" AND (r.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR r.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    let ingredient_patterns = filter
        .ingredient_names
        .iter()
        .filter_map(|name| non_blank(Some(name.as_str())))
        .map(like_pattern)
        .collect::<Vec<_>>();
    if !ingredient_patterns.is_empty() {
        query
            .push(
                " AND EXISTS (
                    SELECT 1
                    FROM recipe_ingredients ri
                    JOIN ingredients i ON i.id = ri.ingredient_id
                    WHERE ri.recipe_id = r.id AND i.name ILIKE ANY(",
            )
            .push_bind(ingredient_patterns)
            .push("))");
    }

    if let Some(area_name) = non_blank(filter.area_name.as_deref()) {
        query
            .push(" AND a.name ILIKE ")
            .push_bind(like_pattern(area_name));
    }

    if !filter.area_ids.is_empty() {
        query
            .push(" AND r.area_id = ANY(")
            .push_bind(filter.area_ids.clone())
            .push(")");
    }

    if !filter.category_ids.is_empty() {
        query
            .push(
                " AND EXISTS (
                    SELECT 1 FROM recipe_categories rc
                    WHERE rc.recipe_id = r.id AND rc.category_id = ANY(",
            )
            .push_bind(filter.category_ids.clone())
            .push("))");
    }

    if let Some(user_id) = filter.user_id {
        query.push(" AND r.user_id = ").push_bind(user_id);
    }

    if let Some(voter) = filter.voted_by {
        query
            .push(" AND EXISTS (SELECT 1 FROM votes vb WHERE vb.recipe_id = r.id AND vb.user_id = ")
            .push_bind(voter)
            .push(")");
    }
}

impl Recipe {
    #[tracing::instrument(skip(pool), err)]
    pub async fn search(pool: &PgPool, filter: &RecipeFilter, page: Page) -> Result<RecipePage> {
        let mut count_query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM recipes r JOIN areas a ON a.id = r.area_id",
        );
        push_filters(&mut count_query, filter);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await?;

        let mut rows_query = QueryBuilder::<Postgres>::new(RECIPE_ROW_SELECT);
        push_filters(&mut rows_query, filter);
        rows_query
            .push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = rows_query
            .build_query_as::<RecipeRow>()
            .fetch_all(pool)
            .await?;

        Ok(RecipePage {
            recipes: summarize(pool, rows).await?,
            total,
            page: page.page,
            page_size: page.page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("pho"), "%pho%");
        assert_eq!(like_pattern("100%_real\\"), "%100\\%\\_real\\\\%");
    }

    #[test]
    fn blank_values_are_ignored() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" bún ")), Some("bún"));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn filters_only_add_clauses_for_present_values() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM recipes r");
        push_filters(&mut query, &RecipeFilter::default());
        assert_eq!(query.sql(), "SELECT 1 FROM recipes r WHERE TRUE");

        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM recipes r");
        push_filters(
            &mut query,
            &RecipeFilter {
                keyword: Some("soup".to_string()),
                ingredient_names: vec![" ".to_string()],
                user_id: Some(4),
                ..Default::default()
            },
        );
        let sql = query.sql();
        assert!(sql.contains("r.name ILIKE $1 OR r.description ILIKE $2"));
        assert!(sql.contains("r.user_id = $3"));
        assert!(!sql.contains("recipe_ingredients"));
    }
}
