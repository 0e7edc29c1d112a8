use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{
    assistant::HistoryMessage,
    http_server::{errors::ServerError, success, ResponseResult},
    services::required_text,
    AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaturalQuery {
    pub prompt: Option<String>,
    pub chat_history: Option<Vec<HistoryMessage>>,
}

#[axum_macros::debug_handler]
pub async fn natural(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<NaturalQuery>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let prompt = required_text(input.prompt.as_deref(), "Prompt is required")?;

    let history = input.chat_history.unwrap_or_default();
    let answer = state.assistant.query(&prompt, &history).await;

    Ok(success(answer))
}
