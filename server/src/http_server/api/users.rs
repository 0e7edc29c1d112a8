use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use db::cooking::{Recipe, RecipeFilter};
use db::users::User;
use serde_json::json;

use super::PageQuery;
use crate::{
    http_server::{created, errors::ServerError, success, ResponseResult},
    services::users::{self, CreateUserInput, UpdateUserInput},
    AppState,
};

#[axum_macros::debug_handler]
pub async fn index(State(state): State<AppState>) -> ResponseResult<impl IntoResponse> {
    let users = User::list(state.db()).await?;

    Ok(success(json!({ "users": users })))
}

#[axum_macros::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<CreateUserInput>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let user = users::create(state.db(), input).await?;

    Ok(created(user))
}

#[axum_macros::debug_handler]
pub async fn show(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    Ok(success(users::get(state.db(), id).await?))
}

#[axum_macros::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
    WithRejection(Json(input), _): WithRejection<Json<UpdateUserInput>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let user = users::update(state.db(), id, input).await?;

    Ok(success(user))
}

#[axum_macros::debug_handler]
pub async fn destroy(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
) -> ResponseResult<StatusCode> {
    users::delete(state.db(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Recipes the user authored, newest first.
#[axum_macros::debug_handler]
pub async fn recipes(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    users::get(state.db(), id).await?;

    let filter = RecipeFilter {
        user_id: Some(id),
        ..Default::default()
    };
    let page = Recipe::search(state.db(), &filter, query.page()).await?;

    Ok(success(page))
}

#[axum_macros::debug_handler]
pub async fn voted_recipes(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    users::get(state.db(), id).await?;

    let filter = RecipeFilter {
        voted_by: Some(id),
        ..Default::default()
    };
    let page = Recipe::search(state.db(), &filter, query.page()).await?;

    Ok(success(page))
}
