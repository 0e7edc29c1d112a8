use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Totals {
    pub areas: i64,
    pub categories: i64,
    pub ingredients: i64,
    pub recipes: i64,
    pub users: i64,
    pub votes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NamedCount {
    pub id: i32,
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MonthCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: i64,
}

pub async fn totals(pool: &PgPool) -> Result<Totals> {
    let totals = sqlx::query_as::<_, Totals>(
        "
        SELECT
            (SELECT COUNT(*) FROM areas) AS areas,
            (SELECT COUNT(*) FROM categories) AS categories,
            (SELECT COUNT(*) FROM ingredients) AS ingredients,
            (SELECT COUNT(*) FROM recipes) AS recipes,
            (SELECT COUNT(*) FROM users) AS users,
            (SELECT COUNT(*) FROM votes) AS votes
        ",
    )
    .fetch_one(pool)
    .await?;

    Ok(totals)
}

/// Active areas that have at least one recipe, busiest first.
pub async fn recipes_by_area(pool: &PgPool) -> Result<Vec<NamedCount>> {
    let counts = sqlx::query_as::<_, NamedCount>(
        "
        SELECT a.id, a.name, COUNT(r.id) AS count
        FROM areas a
        JOIN recipes r ON r.area_id = a.id
        WHERE a.is_active
        GROUP BY a.id, a.name
        ORDER BY count DESC, a.name
        ",
    )
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

pub async fn recipes_by_category(pool: &PgPool) -> Result<Vec<NamedCount>> {
    let counts = sqlx::query_as::<_, NamedCount>(
        "
        SELECT c.id, c.name, COUNT(rc.recipe_id) AS count
        FROM categories c
        JOIN recipe_categories rc ON rc.category_id = c.id
        GROUP BY c.id, c.name
        ORDER BY count DESC, c.name
        ",
    )
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

/// One entry per calendar month (UTC) for the last `months` months including
/// the current one, oldest first. Months without recipes count zero.
#[tracing::instrument(skip(pool), err)]
pub async fn recipes_by_month(pool: &PgPool, months: i32) -> Result<Vec<MonthCount>> {
    let counts = sqlx::query_as::<_, MonthCount>(
        "
        WITH months AS (
            SELECT generate_series(
                date_trunc('month', NOW() AT TIME ZONE 'UTC') - make_interval(months => $1 - 1),
                date_trunc('month', NOW() AT TIME ZONE 'UTC'),
                INTERVAL '1 month'
            ) AS month
        )
        SELECT
            to_char(m.month, 'YYYY-MM') AS month,
            COUNT(r.id) AS count
        FROM months m
        LEFT JOIN recipes r
            ON date_trunc('month', r.created_at AT TIME ZONE 'UTC') = m.month
        GROUP BY m.month
        ORDER BY m.month
        ",
    )
    .bind(months)
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooking::{Area, Category, NewRecipe, Recipe};
    use crate::users::{User, UserRole};

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn monthly_counts_are_zero_filled(pool: PgPool) {
        let months = recipes_by_month(&pool, 6).await.unwrap();

        assert_eq!(months.len(), 6);
        assert!(months.iter().all(|m| m.count == 0 && m.month.len() == 7));
        assert!(months.windows(2).all(|w| w[0].month < w[1].month));
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn inactive_areas_are_left_out(pool: PgPool) {
        let user = User::create(
            &pool,
            "Tuan".to_string(),
            "tuan@example.com".to_string(),
            None,
            UserRole::Admin,
        )
        .await
        .unwrap();
        let hue = Area::create(&pool, "Hue".to_string(), true).await.unwrap();
        let closed = Area::create(&pool, "Closed".to_string(), false)
            .await
            .unwrap();
        let soup = Category::create(&pool, "Soup".to_string()).await.unwrap();

        for area_id in [hue.id, hue.id, closed.id] {
            Recipe::create_with_details(
                &pool,
                NewRecipe {
                    name: "Bún bò".to_string(),
                    description: "Spicy beef noodles".to_string(),
                    user_id: user.id,
                    area_id,
                    category_ids: vec![soup.id],
                    thumbnails: vec![],
                    steps: vec![],
                    ingredients: vec![],
                },
            )
            .await
            .unwrap();
        }

        let by_area = recipes_by_area(&pool).await.unwrap();
        assert_eq!(
            by_area,
            vec![NamedCount {
                id: hue.id,
                name: "Hue".to_string(),
                count: 2,
            }]
        );

        let by_category = recipes_by_category(&pool).await.unwrap();
        assert_eq!(by_category[0].count, 3);

        let totals = totals(&pool).await.unwrap();
        assert_eq!(totals.recipes, 3);
        assert_eq!(totals.areas, 2);
        assert_eq!(recipes_by_month(&pool, 1).await.unwrap()[0].count, 3);
    }
}
