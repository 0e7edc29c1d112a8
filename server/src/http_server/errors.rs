use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use color_eyre::Report;
use serde_json::json;

use crate::services::ServiceError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// An error on its way out of a handler, with the status it should be served
/// as. The body is `{"status":"error","message":...}`.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct ServerError(pub(crate) Report, pub(crate) StatusCode);

impl ServerError {
    pub(crate) fn new(message: impl Into<String>, status: StatusCode) -> Self {
        ServerError(Report::msg(message.into()), status)
    }

    fn public_message(&self) -> String {
        if self.1.is_server_error() {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.0.to_string()
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.1.is_server_error() {
            sentry::capture_error(&self);
            tracing::error!(error = ?self.0, status = %self.1, "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = %self.1, "Request rejected");
        }

        let body = json!({
            "status": "error",
            "message": self.public_message(),
        });

        (self.1, Json(body)).into_response()
    }
}

impl From<Report> for ServerError {
    fn from(err: Report) -> Self {
        ServerError(err, StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<ServiceError> for ServerError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => ServerError::new(message, StatusCode::BAD_REQUEST),
            ServiceError::Conflict(message) => ServerError::new(message, StatusCode::CONFLICT),
            ServiceError::NotFound(message) => ServerError::new(message, StatusCode::NOT_FOUND),
            ServiceError::Internal(report) => report.into(),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::new(rejection.body_text(), rejection.status())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        ServerError::new(rejection.body_text(), rejection.status())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::new(rejection.body_text(), rejection.status())
    }
}

pub(crate) trait WithStatus<T> {
    fn with_status(self, status: StatusCode) -> Result<T, ServerError>;
}

impl<T> WithStatus<T> for Result<T, Report> {
    fn with_status(self, status: StatusCode) -> Result<T, ServerError> {
        self.map_err(|err| ServerError(err, status))
    }
}
