use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    http_server::{created, errors::ServerError, success, ResponseResult},
    services::{
        notifications::{self, CreateNotificationInput},
        validation,
    },
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadInput {
    pub is_read: Option<bool>,
}

#[axum_macros::debug_handler]
pub async fn index(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<i32>, ServerError>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let notifications =
        notifications::list_for_user(state.db(), user_id, query.unread_only).await?;

    Ok(success(json!({ "notifications": notifications })))
}

#[axum_macros::debug_handler]
pub async fn read_all(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): WithRejection<Path<i32>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let updated = notifications::mark_all_read(state.db(), user_id).await?;

    Ok(success(json!({ "updated": updated })))
}

#[axum_macros::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<CreateNotificationInput>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let notification = notifications::create(state.db(), input).await?;

    Ok(created(notification))
}

#[axum_macros::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
    WithRejection(Json(input), _): WithRejection<Json<ReadInput>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let is_read = input
        .is_read
        .ok_or_else(|| validation("isRead is required"))?;

    Ok(success(notifications::set_read(state.db(), id, is_read).await?))
}

#[axum_macros::debug_handler]
pub async fn destroy(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
) -> ResponseResult<StatusCode> {
    notifications::delete(state.db(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
