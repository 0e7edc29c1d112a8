use axum::{extract::State, response::IntoResponse};
use serde::Serialize;

use crate::{http_server::success, AppState};

#[derive(Serialize)]
struct Health {
    version: &'static str,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    success(Health {
        version: state.versions.version,
    })
}
