use color_eyre::eyre::eyre;

use crate::*;

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: Option<f32>,
    max_tokens: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize)]
struct CompletionChoice {
    index: i64,
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    model: String,
}

#[instrument(skip(config, messages), fields(messages = messages.len()), err)]
pub async fn complete_chat(
    config: &OpenAiConfig,
    model: &str,
    temperature: Option<f32>,
    messages: &[ChatMessage],
) -> Result<ChatMessage> {
    let body = ChatCompletionBody {
        model,
        messages,
        temperature,
        max_tokens: None,
    };

    let response: CompletionResponse = post_json(config, "chat/completions", &body).await?;
    tracing::debug!(model = %response.model, "Chat completion received");

    let choice = response
        .choices
        .into_iter()
        .min_by_key(|c| c.index)
        .ok_or_else(|| eyre!("Chat completion returned no choices"))?;

    Ok(choice.message)
}
