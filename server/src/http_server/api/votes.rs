use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{
    http_server::{created, errors::ServerError, ResponseResult},
    services::{validation, votes},
    AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteInput {
    pub user_id: Option<i32>,
}

#[axum_macros::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    WithRejection(Path(recipe_id), _): WithRejection<Path<i32>, ServerError>,
    WithRejection(Json(input), _): WithRejection<Json<VoteInput>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let user_id = input
        .user_id
        .ok_or_else(|| validation("userId is required"))?;

    let vote = votes::vote(state.db(), user_id, recipe_id).await?;

    Ok(created(vote))
}

#[axum_macros::debug_handler]
pub async fn destroy(
    State(state): State<AppState>,
    WithRejection(Path((recipe_id, user_id)), _): WithRejection<Path<(i32, i32)>, ServerError>,
) -> ResponseResult<StatusCode> {
    votes::unvote(state.db(), user_id, recipe_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
