//! Validation and business rules between the HTTP handlers and `db`.

use color_eyre::Report;

pub(crate) mod catalog;
pub(crate) mod images;
pub(crate) mod notifications;
pub(crate) mod recipes;
pub(crate) mod users;
pub(crate) mod votes;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0:?}")]
    Internal(Report),
}

impl From<Report> for ServiceError {
    fn from(err: Report) -> Self {
        ServiceError::Internal(err)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub(crate) fn validation(message: impl Into<String>) -> ServiceError {
    ServiceError::Validation(message.into())
}

pub(crate) fn not_found(message: impl Into<String>) -> ServiceError {
    ServiceError::NotFound(message.into())
}

pub(crate) fn conflict(message: impl Into<String>) -> ServiceError {
    ServiceError::Conflict(message.into())
}

/// Turns constraint violations that slipped past the pre-checks into a
/// conflict with `message`.
pub(crate) fn conflict_on_violation(err: Report, message: &str) -> ServiceError {
    if db::is_unique_violation(&err) || db::is_foreign_key_violation(&err) {
        conflict(message)
    } else {
        ServiceError::Internal(err)
    }
}

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required_text(value: Option<&str>, message: &str) -> ServiceResult<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| validation(message))
}

pub(crate) fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
