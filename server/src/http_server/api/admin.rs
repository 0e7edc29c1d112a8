use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use color_eyre::eyre::WrapErr as _;
use db::stats::{self, MonthCount, NamedCount, Totals};
use serde::{Deserialize, Serialize};

use crate::{
    http_server::{errors::ServerError, success, ResponseResult},
    AppState,
};

const DEFAULT_MONTHS: i32 = 6;
const MAX_MONTHS: i32 = 24;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub months: Option<i32>,
}

impl StatsQuery {
    fn months(&self) -> i32 {
        self.months.unwrap_or(DEFAULT_MONTHS).clamp(1, MAX_MONTHS)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    totals: Totals,
    recipes_by_area: Vec<NamedCount>,
    recipes_by_category: Vec<NamedCount>,
    recipes_by_month: Vec<MonthCount>,
}

#[axum_macros::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<StatsQuery>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let pool = state.db();

    let (totals, recipes_by_area, recipes_by_category, recipes_by_month) = futures::try_join!(
        stats::totals(pool),
        stats::recipes_by_area(pool),
        stats::recipes_by_category(pool),
        stats::recipes_by_month(pool, query.months()),
    )
    .wrap_err("Failed to load dashboard stats")?;

    Ok(success(AdminStats {
        totals,
        recipes_by_area,
        recipes_by_category,
        recipes_by_month,
    }))
}
