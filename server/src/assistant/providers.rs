use async_trait::async_trait;
use color_eyre::Result;
use db::cooking::{Recipe, RecipeFilter, RecipeIngredient};
use db::{Page, PgPool};
use itertools::Itertools as _;
use openai::ChatMessage;

use super::{intent::SearchParams, Candidate, ChatModel, RecipeCatalog};
use crate::state::LlmConfig;

const CANDIDATE_PAGE_SIZE: i64 = 5;

/// Any OpenAI-compatible chat endpoint, Groq by default.
#[derive(Debug, Clone)]
pub struct HostedChat {
    config: LlmConfig,
}

impl HostedChat {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ChatModel for HostedChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let reply = openai::complete_chat(
            &self.config.api,
            &self.config.model,
            Some(self.config.temperature),
            messages,
        )
        .await?;

        Ok(reply.content)
    }
}

/// Looks candidates up in the recipe tables.
#[derive(Debug, Clone)]
pub struct StoredRecipes {
    pool: PgPool,
}

impl StoredRecipes {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipeCatalog for StoredRecipes {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Candidate>> {
        let filter = RecipeFilter {
            keyword: Some(params.keyword.clone()),
            ingredient_names: params.ingredients.clone(),
            area_name: Some(params.area.clone()),
            ..Default::default()
        };
        let found = Recipe::search(
            &self.pool,
            &filter,
            Page::new(Some(1), Some(CANDIDATE_PAGE_SIZE)),
        )
        .await?;
        tracing::debug!(total = found.total, "Assistant catalogue search");

        let ids = found.recipes.iter().map(|r| r.id).collect::<Vec<_>>();
        let mut lines = RecipeIngredient::for_recipes(&self.pool, &ids)
            .await?
            .into_iter()
            .into_group_map_by(|line| line.recipe_id);

        let candidates = found
            .recipes
            .into_iter()
            .map(|recipe| Candidate {
                ingredients: lines
                    .remove(&recipe.id)
                    .unwrap_or_default()
                    .iter()
                    .map(RecipeIngredient::label)
                    .collect(),
                id: recipe.id,
                name: recipe.name,
                description: recipe.description,
            })
            .collect();

        Ok(candidates)
    }
}
