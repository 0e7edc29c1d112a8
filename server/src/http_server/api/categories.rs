use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use color_eyre::eyre::eyre;
use db::cooking::Category;
use serde_json::json;

use crate::{
    http_server::{created, errors::ServerError, errors::WithStatus as _, success, ResponseResult},
    services::catalog::{categories, NameInput},
    AppState,
};

#[axum_macros::debug_handler]
pub async fn index(State(state): State<AppState>) -> ResponseResult<impl IntoResponse> {
    let categories = Category::list(state.db()).await?;

    Ok(success(json!({ "categories": categories })))
}

#[axum_macros::debug_handler]
pub async fn show(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let category = Category::get_by_id(state.db(), id)
        .await?
        .ok_or_else(|| eyre!("Category not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(success(category))
}

#[axum_macros::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<NameInput>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let category = categories::create(state.db(), input).await?;

    Ok(created(category))
}

#[axum_macros::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
    WithRejection(Json(input), _): WithRejection<Json<NameInput>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let category = categories::update(state.db(), id, input).await?;

    Ok(success(category))
}

#[axum_macros::debug_handler]
pub async fn destroy(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
) -> ResponseResult<StatusCode> {
    categories::delete(state.db(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
