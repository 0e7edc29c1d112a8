use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use color_eyre::eyre::eyre;
use db::cooking::Attachment;

use crate::{
    http_server::{errors::ServerError, errors::WithStatus as _, ResponseResult},
    AppState,
};

/// Replacing an image stores it under a new id, so bytes behind an id never
/// change.
const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[axum_macros::debug_handler]
pub async fn show(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i32>, ServerError>,
) -> ResponseResult<impl IntoResponse> {
    let attachment = Attachment::get_by_id(state.db(), id)
        .await
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or_else(|| eyre!("Attachment not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok((
        [
            (header::CONTENT_TYPE, attachment.mime_type),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
        ],
        attachment.data,
    ))
}
