use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{assistant::RecipeAssistant, AppConfig, AppState};

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.app.clone()
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Arc<RecipeAssistant> {
    fn from_ref(state: &AppState) -> Self {
        state.assistant.clone()
    }
}
