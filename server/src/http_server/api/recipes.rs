use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, NaiveTime, Utc};
use db::cooking::{Recipe, RecipeFilter};
use serde::Deserialize;

use super::{comma_ids, comma_list, LimitQuery};
use crate::{
    http_server::{created, errors::ServerError, success, ResponseResult},
    services::{
        recipes::{self, CreateRecipeInput, UpdateRecipeInput},
        ServiceResult,
    },
    AppState,
};

/// List parameters are comma separated, e.g. `ingredientNames=beef,rice noodles`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub ingredient_names: Option<String>,
    pub area_name: Option<String>,
    pub area_ids: Option<String>,
    pub category_ids: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

impl SearchQuery {
    pub(crate) fn filter(&self) -> ServiceResult<RecipeFilter> {
        Ok(RecipeFilter {
            keyword: non_blank(self.keyword.as_deref()),
            ingredient_names: comma_list(self.ingredient_names.as_deref()),
            area_name: non_blank(self.area_name.as_deref()),
            area_ids: comma_ids(self.area_ids.as_deref(), "areaIds")?,
            category_ids: comma_ids(self.category_ids.as_deref(), "categoryIds")?,
            ..Default::default()
        })
    }
}

pub(crate) fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[axum_macros::debug_handler]
pub async fn index(State(state): State<AppState>) -> ResponseResult<impl IntoResponse> {
    Ok(success(Recipe::list_all(state.db()).await?))
}

#[axum_macros::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let filter = query.filter()?;
    let page = db::Page::new(query.page, query.page_size);

    Ok(success(Recipe::search(state.db(), &filter, page).await?))
}

#[axum_macros::debug_handler]
pub async fn newest(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<LimitQuery>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    Ok(success(Recipe::newest(state.db(), query.limit()).await?))
}

#[axum_macros::debug_handler]
pub async fn top_voted_today(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<LimitQuery>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let since = start_of_utc_day(Utc::now());

    Ok(success(
        Recipe::top_voted_since(state.db(), since, query.limit()).await?,
    ))
}

#[axum_macros::debug_handler]
pub async fn random(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<LimitQuery>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    Ok(success(Recipe::random(state.db(), query.limit()).await?))
}

#[axum_macros::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<CreateRecipeInput>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let recipe = recipes::create(state.db(), input, state.app.max_image_bytes).await?;

    Ok(created(recipe))
}

#[axum_macros::debug_handler]
pub async fn show(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    Ok(success(recipes::details(state.db(), id).await?))
}

#[axum_macros::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
    WithRejection(Json(input), _): WithRejection<Json<UpdateRecipeInput>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let recipe = recipes::update(state.db(), id, input, state.app.max_image_bytes).await?;

    Ok(success(recipe))
}

#[axum_macros::debug_handler]
pub async fn destroy(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
) -> ResponseResult<StatusCode> {
    recipes::delete(state.db(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
