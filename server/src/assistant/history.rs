use std::sync::LazyLock;

use openai::ChatMessage;
use regex::Regex;
use serde::{Deserialize, Serialize};

const CONTEXT_WINDOW: usize = 4;
const TURN_WINDOW: usize = 6;
const SUGGESTED_ID_WINDOW: usize = 3;
const DISH_NAME_WINDOW: usize = 2;

pub(crate) const START_OF_CONVERSATION: &str = "This is the start of the conversation.";

static BOLD_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("bold span pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A prior turn as the client replays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<i32>,
}

fn last<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

/// The last few turns as plain text for the intent prompt.
pub(crate) fn context(history: &[HistoryMessage]) -> String {
    if history.is_empty() {
        return START_OF_CONVERSATION.to_string();
    }

    last(history, CONTEXT_WINDOW)
        .iter()
        .map(|message| {
            let prefix = match message.role {
                Role::User => "USER",
                Role::Assistant => "ASSISTANT",
            };
            match message.recipe_id {
                Some(id) => format!("{prefix}: {} [suggested recipe #{id}]", message.content),
                None => format!("{prefix}: {}", message.content),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ids of the recipes the assistant suggested most recently.
pub(crate) fn recently_suggested_ids(history: &[HistoryMessage]) -> Vec<i32> {
    let ids = history
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .filter_map(|m| m.recipe_id)
        .collect::<Vec<_>>();

    last(&ids, SUGGESTED_ID_WINDOW).to_vec()
}

/// Dish names the assistant highlighted in bold in its latest answers.
pub(crate) fn recently_suggested_dishes(history: &[HistoryMessage]) -> Vec<String> {
    let answers = history
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .collect::<Vec<_>>();

    last(&answers, DISH_NAME_WINDOW)
        .iter()
        .filter_map(|m| BOLD_SPAN.captures(&m.content))
        .filter_map(|c| c.get(1))
        .map(|name| name.as_str().to_string())
        .collect()
}

/// Replays the latest turns to the model.
pub(crate) fn as_chat_turns(history: &[HistoryMessage]) -> Vec<ChatMessage> {
    last(history, TURN_WINDOW)
        .iter()
        .map(|message| match message.role {
            Role::User => ChatMessage::user(message.content.clone()),
            Role::Assistant => ChatMessage::assistant(message.content.clone()),
        })
        .collect()
}
