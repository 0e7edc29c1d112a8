use axum::http::StatusCode;
use serde::Deserialize;

use super::errors::ServerError;
use crate::services::{validation, ServiceResult};

pub mod admin;
pub mod areas;
pub mod attachments;
pub mod categories;
pub mod health;
pub mod ingredients;
pub mod notifications;
pub mod query;
pub mod recipes;
pub mod users;
pub mod votes;

pub const DEFAULT_FEED_LIMIT: i64 = 5;
pub const MAX_FEED_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> db::Page {
        db::Page::new(self.page, self.page_size)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_FEED_LIMIT)
            .clamp(1, MAX_FEED_LIMIT)
    }
}

/// Parses `1,2, 3` into ids. Empty segments are skipped.
pub(crate) fn comma_ids(raw: Option<&str>, field: &str) -> ServiceResult<Vec<i32>> {
    comma_list(raw)
        .into_iter()
        .map(|part| {
            part.parse()
                .map_err(|_| validation(format!("{field} must be a comma separated list of ids")))
        })
        .collect()
}

pub(crate) fn comma_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub async fn not_found() -> ServerError {
    ServerError::new("Route not found", StatusCode::NOT_FOUND)
}
