use std::{path::PathBuf, sync::Arc};

use color_eyre::eyre::WrapErr as _;
use color_eyre::Result;
use db::setup_db_pool;
use openai::{OpenAiConfig, OPENAI_BASE_URL};
use sqlx::PgPool;
use tracing::instrument;

use crate::assistant::RecipeAssistant;

const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_ASSISTANT_LANGUAGE: &str = "Vietnamese";

fn parsed_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .wrap_err_with(|| format!("{name} is not a valid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// `None` allows any origin.
    pub cors_allowed_origins: Option<Vec<String>>,
    pub max_image_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors_allowed_origins: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl AppConfig {
    #[instrument(name = "AppConfig::from_env")]
    pub fn from_env() -> Result<Self> {
        let cors_allowed_origins = non_empty_var("CORS_ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(ToString::to_string)
                .collect()
        });

        Ok(Self {
            port: parsed_var("PORT", DEFAULT_PORT)?,
            cors_allowed_origins,
            max_image_bytes: parsed_var("MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api: OpenAiConfig,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api: OpenAiConfig,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub llm: LlmConfig,
    /// Knowledge lookup is off without an embeddings key.
    pub embedding: Option<EmbeddingConfig>,
    pub knowledge_dir: Option<PathBuf>,
    pub language: String,
}

impl AssistantConfig {
    #[instrument(name = "AssistantConfig::from_env")]
    pub fn from_env() -> Result<Self> {
        let api_key = non_empty_var("LLM_API_KEY")
            .or_else(|| non_empty_var("GROQ_API_KEY"))
            .ok_or_else(|| color_eyre::eyre::eyre!("Missing LLM_API_KEY (or GROQ_API_KEY)"))?;

        let llm = LlmConfig {
            api: OpenAiConfig::new(
                api_key,
                non_empty_var("LLM_BASE_URL").unwrap_or_else(|| GROQ_BASE_URL.to_string()),
            ),
            model: non_empty_var("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature: parsed_var("LLM_TEMPERATURE", DEFAULT_LLM_TEMPERATURE)?,
        };

        let embedding = non_empty_var("EMBEDDING_API_KEY").map(|key| EmbeddingConfig {
            api: OpenAiConfig::new(
                key,
                non_empty_var("EMBEDDING_BASE_URL").unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            ),
            model: non_empty_var("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
        });

        Ok(Self {
            llm,
            embedding,
            knowledge_dir: non_empty_var("KNOWLEDGE_DIR").map(PathBuf::from),
            language: non_empty_var("ASSISTANT_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_ASSISTANT_LANGUAGE.to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub version: &'static str,
}

impl VersionInfo {
    pub(crate) fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub app: AppConfig,
    pub versions: VersionInfo,
    pub db: PgPool,
    pub assistant: Arc<RecipeAssistant>,
}

impl AppState {
    #[instrument(name = "AppState::from_env", err)]
    pub async fn from_env() -> Result<Self> {
        let app = AppConfig::from_env()?;
        let assistant_config = AssistantConfig::from_env()?;
        let db = setup_db_pool().await?;

        let assistant = RecipeAssistant::from_config(&assistant_config, db.clone()).await?;

        Ok(AppState {
            app,
            versions: VersionInfo::current(),
            db,
            assistant: Arc::new(assistant),
        })
    }

    pub fn db(&self) -> &PgPool {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        assert_eq!(
            parsed_var("COOKPAC_TEST_UNSET_PORT", DEFAULT_PORT).unwrap(),
            3000
        );
        assert_eq!(non_empty_var("COOKPAC_TEST_UNSET_ORIGINS"), None);
    }

    #[test]
    fn default_image_limit_is_five_mebibytes() {
        assert_eq!(AppConfig::default().max_image_bytes, 5_242_880);
    }
}
