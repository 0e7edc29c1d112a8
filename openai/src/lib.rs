use color_eyre::eyre::WrapErr as _;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub mod chat;
pub mod embeddings;

pub use chat::{complete_chat, ChatMessage, ChatRole};
pub use embeddings::embed;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Credentials and endpoint of an OpenAI-compatible API. Any provider that
/// speaks the same wire format (Groq, a local proxy) works by swapping
/// `base_url`.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[instrument(name = "OpenAiConfig::from_env")]
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("OPENAI_API_KEY").wrap_err("No OpenAI API KEY Found")?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| OPENAI_BASE_URL.to_string());

        Ok(Self::new(api_key, base_url))
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// A non-2xx answer from the API.
#[derive(Debug, thiserror::Error)]
#[error("OpenAI API returned {status}: {body}")]
pub struct ApiError {
    pub status: reqwest::StatusCode,
    pub body: String,
}

pub(crate) async fn post_json<B, R>(config: &OpenAiConfig, path: &str, body: &B) -> Result<R>
where
    B: Serialize + ?Sized,
    R: for<'de> Deserialize<'de>,
{
    let client = reqwest::Client::new();

    let res = client
        .post(config.url(path))
        .bearer_auth(&config.api_key)
        .json(body)
        .send()
        .await
        .wrap_err("Failed to reach the OpenAI API")?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        tracing::warn!(%status, %body, "OpenAI API request failed");

        return Err(ApiError { status, body }.into());
    }

    res.json::<R>()
        .await
        .wrap_err("Failed to parse the OpenAI API response")
}
