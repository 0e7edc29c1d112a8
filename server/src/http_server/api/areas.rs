use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use color_eyre::eyre::eyre;
use db::cooking::Area;
use serde_json::json;

use crate::{
    http_server::{created, errors::ServerError, errors::WithStatus as _, success, ResponseResult},
    services::catalog::{areas, AreaInput},
    AppState,
};

#[axum_macros::debug_handler]
pub async fn index(State(state): State<AppState>) -> ResponseResult<impl IntoResponse> {
    let areas = Area::list(state.db()).await?;

    Ok(success(json!({ "areas": areas })))
}

#[axum_macros::debug_handler]
pub async fn show(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let area = Area::get_by_id(state.db(), id)
        .await?
        .ok_or_else(|| eyre!("Area not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(success(area))
}

#[axum_macros::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<AreaInput>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let area = areas::create(state.db(), input).await?;

    Ok(created(area))
}

#[axum_macros::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
    WithRejection(Json(input), _): WithRejection<Json<AreaInput>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let area = areas::update(state.db(), id, input).await?;

    Ok(success(area))
}

#[axum_macros::debug_handler]
pub async fn destroy(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
) -> ResponseResult<StatusCode> {
    areas::delete(state.db(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
