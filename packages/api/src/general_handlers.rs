// ABOUTME: Service-level endpoints that are not tied to an entity
// ABOUTME: Health report with masked settings and the running version

use axum::{extract::State, Json};
use metatag_storage::list_tables;
use serde_json::{json, Map, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let tables = list_tables(&state.pool)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let mut settings: Map<String, Value> = state
        .settings
        .diagnostics()
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value)))
        .collect();
    settings.insert("DB_TABLES".to_string(), json!(tables));

    Ok(Json(json!({
        "status": "ok",
        "settings": settings,
    })))
}

pub async fn version(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "version": state.settings.version() }))
}
