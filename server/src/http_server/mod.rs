use axum::{http::StatusCode, response::Response, Json};
use serde::Serialize;

pub(crate) mod cmd;

mod api;
mod config;
pub mod errors;
mod routes;
mod trace;

#[cfg(test)]
pub(crate) mod test_helpers;

use errors::ServerError;

type ResponseResult<T = Response> = Result<T, ServerError>;

#[derive(Debug, Serialize)]
pub(crate) struct Success<T> {
    status: &'static str,
    data: T,
}

/// `{"status":"success","data":...}`
pub(crate) fn success<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        status: "success",
        data,
    })
}

pub(crate) fn created<T: Serialize>(data: T) -> (StatusCode, Json<Success<T>>) {
    (StatusCode::CREATED, success(data))
}
