//! The conversational cooking assistant.
//!
//! A query takes two chat completions. The first classifies the request as a
//! lookup or an invention and extracts search terms; the second writes the
//! answer, grounded on stored recipes and on any cooking notes in the
//! knowledge base. The model, the recipe lookup and the knowledge base sit
//! behind traits so the flow can run against fakes.

use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::Result;
use openai::ChatMessage;
use serde::Serialize;
use sqlx::PgPool;

use crate::state::AssistantConfig;

pub(crate) mod history;
pub(crate) mod intent;
pub(crate) mod knowledge;
pub(crate) mod prompts;
mod providers;

pub use history::{HistoryMessage, Role};
use intent::{Intent, IntentAnalysis, SearchParams};
use knowledge::{EmbeddedNotes, NoKnowledge};
use providers::{HostedChat, StoredRecipes};

const KNOWLEDGE_RESULTS: usize = 3;

const APOLOGY_VI: &str =
    "Xin lỗi, hiện tại mình chưa thể trả lời câu hỏi này. Bạn vui lòng thử lại sau nhé!";
const APOLOGY_EN: &str =
    "Sorry, I can't answer that right now. Please try again in a moment!";

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the content of the model's reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    async fn search(&self, params: &SearchParams) -> Result<Vec<Candidate>>;
}

#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Up to `limit` passages, most similar first.
    async fn similar(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// A stored recipe offered to the model, with its ingredient lines in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnswer {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<i32>,
    pub is_new_recipe: bool,
}

pub struct RecipeAssistant {
    chat: Arc<dyn ChatModel>,
    catalog: Arc<dyn RecipeCatalog>,
    knowledge: Arc<dyn KnowledgeBase>,
    language: String,
}

impl RecipeAssistant {
    pub fn new(
        chat: Arc<dyn ChatModel>,
        catalog: Arc<dyn RecipeCatalog>,
        knowledge: Arc<dyn KnowledgeBase>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            chat,
            catalog,
            knowledge,
            language: language.into(),
        }
    }

    #[tracing::instrument(name = "RecipeAssistant::from_config", skip_all, err)]
    pub async fn from_config(config: &AssistantConfig, pool: PgPool) -> Result<Self> {
        let knowledge: Arc<dyn KnowledgeBase> = match (&config.embedding, &config.knowledge_dir) {
            (Some(embedding), Some(dir)) => Arc::new(
                EmbeddedNotes::load(embedding.api.clone(), embedding.model.clone(), dir).await?,
            ),
            (None, Some(dir)) => {
                tracing::warn!(
                    dir = %dir.display(),
                    "KNOWLEDGE_DIR is set without EMBEDDING_API_KEY, knowledge lookup disabled"
                );
                Arc::new(NoKnowledge)
            }
            (_, None) => Arc::new(NoKnowledge),
        };

        Ok(Self::new(
            Arc::new(HostedChat::new(config.llm.clone())),
            Arc::new(StoredRecipes::new(pool)),
            knowledge,
            config.language.clone(),
        ))
    }

    /// Never fails: model and lookup errors degrade to defaults, and a
    /// failed final completion becomes an apology.
    #[tracing::instrument(skip_all, fields(history = history.len()))]
    pub async fn query(&self, prompt: &str, history: &[HistoryMessage]) -> QueryAnswer {
        let analysis = self.analyse(prompt, history).await;
        tracing::debug!(?analysis, "Intent analysis");

        let candidates = if analysis.intent == Intent::Search
            || !analysis.search_params.keyword.trim().is_empty()
        {
            self.candidates(&analysis.search_params, history).await
        } else {
            Vec::new()
        };

        let knowledge = match self.knowledge.similar(prompt, KNOWLEDGE_RESULTS).await {
            Ok(knowledge) => knowledge,
            Err(err) => {
                tracing::warn!(error = ?err, "Knowledge lookup failed");
                Vec::new()
            }
        };

        let is_new_recipe = analysis.intent != Intent::Search || candidates.is_empty();
        let final_prompt = if is_new_recipe {
            prompts::new_recipe(
                prompt,
                &analysis.context_notes,
                &history::recently_suggested_dishes(history),
                &candidates,
                &knowledge,
                &self.language,
            )
        } else {
            prompts::existing_recipe(
                prompt,
                &analysis.context_notes,
                &candidates,
                &knowledge,
                &self.language,
            )
        };
        tracing::debug!(is_new_recipe, candidates = candidates.len(), "Answer strategy");

        let mut messages = history::as_chat_turns(history);
        messages.push(ChatMessage::user(final_prompt));

        let answer = match self.chat.complete(&messages).await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::error!(error = ?err, "Answer completion failed");
                return QueryAnswer {
                    answer: self.apology().to_string(),
                    recipe_id: None,
                    is_new_recipe: false,
                };
            }
        };

        let recipe_id = if is_new_recipe {
            None
        } else {
            matching_recipe(&answer, &candidates)
        };

        QueryAnswer {
            answer,
            recipe_id,
            is_new_recipe,
        }
    }

    async fn analyse(&self, prompt: &str, history: &[HistoryMessage]) -> IntentAnalysis {
        let intent_prompt = prompts::intent(&history::context(history), prompt);

        match self.chat.complete(&[ChatMessage::user(intent_prompt)]).await {
            Ok(reply) => intent::parse(&reply).unwrap_or_else(|| {
                tracing::warn!(%reply, "Couldn't parse intent, defaulting to search");
                IntentAnalysis::default()
            }),
            Err(err) => {
                tracing::warn!(error = ?err, "Intent completion failed, defaulting to search");
                IntentAnalysis::default()
            }
        }
    }

    async fn candidates(&self, params: &SearchParams, history: &[HistoryMessage]) -> Vec<Candidate> {
        let found = match self.catalog.search(params).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(error = ?err, "Recipe lookup failed");
                return Vec::new();
            }
        };

        let suggested = history::recently_suggested_ids(history);
        let total = found.len();
        let candidates = found
            .into_iter()
            .filter(|c| !suggested.contains(&c.id))
            .collect::<Vec<_>>();
        tracing::debug!(
            total,
            kept = candidates.len(),
            "Dropped recently suggested recipes"
        );

        candidates
    }

    fn apology(&self) -> &'static str {
        if self.language.eq_ignore_ascii_case("vietnamese") {
            APOLOGY_VI
        } else {
            APOLOGY_EN
        }
    }
}

/// The first candidate whose name appears in the answer, ignoring case.
fn matching_recipe(answer: &str, candidates: &[Candidate]) -> Option<i32> {
    let answer = answer.to_lowercase();

    candidates
        .iter()
        .filter(|c| !c.name.trim().is_empty())
        .find(|c| answer.contains(&c.name.to_lowercase()))
        .map(|c| c.id)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use color_eyre::eyre::eyre;

    use super::*;

    #[derive(Default)]
    struct ScriptedChat {
        replies: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedChat {
        fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::default(),
            })
        }

        fn calls(&self) -> Vec<Vec<ChatMessage>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.calls.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(eyre!("no scripted reply left")))
        }
    }

    #[derive(Default)]
    struct FixedCatalog {
        recipes: Vec<Candidate>,
        searches: Mutex<Vec<SearchParams>>,
    }

    #[async_trait]
    impl RecipeCatalog for FixedCatalog {
        async fn search(&self, params: &SearchParams) -> Result<Vec<Candidate>> {
            self.searches.lock().unwrap().push(params.clone());
            Ok(self.recipes.clone())
        }
    }

    struct BrokenKnowledge;

    #[async_trait]
    impl KnowledgeBase for BrokenKnowledge {
        async fn similar(&self, _query: &str, _limit: usize) -> Result<Vec<String>> {
            Err(eyre!("embeddings unavailable"))
        }
    }

    fn candidate(id: i32, name: &str) -> Candidate {
        Candidate {
            id,
            name: name.to_string(),
            description: String::new(),
            ingredients: vec!["Beef 300g".to_string()],
        }
    }

    fn assistant(chat: Arc<ScriptedChat>, catalog: Arc<FixedCatalog>) -> RecipeAssistant {
        RecipeAssistant::new(chat, catalog, Arc::new(NoKnowledge), "Vietnamese")
    }

    const SEARCH_PHO: &str = r#"{"intent":"search","searchParams":{"keyword":"phở","ingredients":["beef"],"area":""},"contextNotes":""}"#;
    const CREATE: &str = r#"{"intent":"create","searchParams":{"keyword":"","ingredients":[],"area":""},"contextNotes":"wants a new dish"}"#;

    #[tokio::test]
    async fn search_intent_answers_with_a_stored_recipe() {
        let chat = ScriptedChat::new(vec![
            Ok(SEARCH_PHO.to_string()),
            Ok("Bạn thử món PHỞ BÒ HÀ NỘI nhé".to_string()),
        ]);
        let catalog = Arc::new(FixedCatalog {
            recipes: vec![candidate(3, "Bún bò"), candidate(4, "Phở bò Hà Nội")],
            ..Default::default()
        });

        let answer = assistant(chat.clone(), catalog.clone())
            .query("how do I cook phở?", &[])
            .await;

        assert_eq!(
            answer,
            QueryAnswer {
                answer: "Bạn thử món PHỞ BÒ HÀ NỘI nhé".to_string(),
                recipe_id: Some(4),
                is_new_recipe: false,
            }
        );
        assert_eq!(catalog.searches.lock().unwrap()[0].keyword, "phở");

        let calls = chat.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0][0].content.contains(history::START_OF_CONVERSATION));
        assert!(calls[1][0].content.contains("ID: 4 | Name: Phở bò Hà Nội"));
    }

    #[tokio::test]
    async fn unparsable_intent_falls_back_to_an_empty_search() {
        let chat = ScriptedChat::new(vec![
            Ok("I think they want soup".to_string()),
            Ok("No match in this answer".to_string()),
        ]);
        let catalog = Arc::new(FixedCatalog {
            recipes: vec![candidate(1, "Canh chua")],
            ..Default::default()
        });

        let answer = assistant(chat, catalog.clone()).query("soup?", &[]).await;

        assert_eq!(
            catalog.searches.lock().unwrap().as_slice(),
            &[SearchParams::default()]
        );
        assert!(!answer.is_new_recipe);
        assert_eq!(answer.recipe_id, None);
    }

    #[tokio::test]
    async fn failed_intent_call_still_searches() {
        let chat = ScriptedChat::new(vec![Err(eyre!("rate limited")), Ok("Canh chua".to_string())]);
        let catalog = Arc::new(FixedCatalog {
            recipes: vec![candidate(1, "Canh chua")],
            ..Default::default()
        });

        let answer = assistant(chat, catalog).query("soup?", &[]).await;

        assert_eq!(answer.recipe_id, Some(1));
    }

    #[tokio::test]
    async fn create_intent_invents_a_dish_and_avoids_recent_ones() {
        let chat = ScriptedChat::new(vec![
            Ok(format!("```json\n{CREATE}\n```")),
            Ok("**Gà sả ớt kiểu mới**".to_string()),
        ]);
        let catalog = Arc::new(FixedCatalog::default());
        let history = vec![
            HistoryMessage {
                role: Role::User,
                content: "chicken ideas".to_string(),
                recipe_id: None,
            },
            HistoryMessage {
                role: Role::Assistant,
                content: "Try **Gà nướng mật ong**".to_string(),
                recipe_id: Some(9),
            },
        ];

        let answer = assistant(chat.clone(), catalog.clone())
            .query("something different", &history)
            .await;

        assert!(answer.is_new_recipe);
        assert_eq!(answer.recipe_id, None);
        assert!(catalog.searches.lock().unwrap().is_empty());

        let last_call = chat.calls().pop().unwrap();
        assert_eq!(last_call.len(), 3);
        assert_eq!(last_call[0], ChatMessage::user("chicken ideas"));
        assert!(last_call[2].content.contains("Gà nướng mật ong"));
        assert!(last_call[2].content.contains("Context: wants a new dish"));
    }

    #[tokio::test]
    async fn recently_suggested_recipes_are_not_offered_again() {
        let chat = ScriptedChat::new(vec![
            Ok(SEARCH_PHO.to_string()),
            Ok("A brand new **Phở cuốn**".to_string()),
        ]);
        let catalog = Arc::new(FixedCatalog {
            recipes: vec![candidate(4, "Phở bò")],
            ..Default::default()
        });
        let history = vec![HistoryMessage {
            role: Role::Assistant,
            content: "Here is Phở bò".to_string(),
            recipe_id: Some(4),
        }];

        let answer = assistant(chat.clone(), catalog)
            .query("another phở", &history)
            .await;

        assert!(answer.is_new_recipe);
        let last_call = chat.calls().pop().unwrap();
        assert!(last_call[1].content.contains("creative chef"));
    }

    #[tokio::test]
    async fn failed_answer_becomes_an_apology() {
        let chat = ScriptedChat::new(vec![Ok(SEARCH_PHO.to_string()), Err(eyre!("timeout"))]);
        let catalog = Arc::new(FixedCatalog {
            recipes: vec![candidate(4, "Phở bò")],
            ..Default::default()
        });

        let answer = RecipeAssistant::new(chat, catalog, Arc::new(BrokenKnowledge), "English")
            .query("phở", &[])
            .await;

        assert_eq!(
            answer,
            QueryAnswer {
                answer: APOLOGY_EN.to_string(),
                recipe_id: None,
                is_new_recipe: false,
            }
        );
    }

    #[test]
    fn matching_is_case_insensitive_and_ordered() {
        let candidates = vec![candidate(1, "Bún chả"), candidate(2, "Chả")];

        assert_eq!(matching_recipe("Món BÚN CHẢ rất ngon", &candidates), Some(1));
        assert_eq!(matching_recipe("chả giò", &candidates), Some(2));
        assert_eq!(matching_recipe("phở", &candidates), None);
    }

    #[test]
    fn answers_serialize_without_a_missing_recipe_id() {
        let json = serde_json::to_value(QueryAnswer {
            answer: "hi".to_string(),
            recipe_id: None,
            is_new_recipe: true,
        })
        .unwrap();

        assert_eq!(json, serde_json::json!({ "answer": "hi", "isNewRecipe": true }));
    }
}
