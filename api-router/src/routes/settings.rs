use std::collections::BTreeMap;

use axum::{extract::State, response::IntoResponse, Json};
use common::runtime_config::schema;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

/// Static category/setting metadata for the configuration UI.
pub async fn get_settings_schema() -> impl IntoResponse {
    Json(schema::CATEGORIES)
}

/// Current value for every declared key, schema defaults applied for keys
/// never set.
pub async fn get_settings_values(State(state): State<ApiState>) -> impl IntoResponse {
    let values: BTreeMap<&'static str, String> = schema::all_settings()
        .map(|def| (def.key, state.runtime.get(def.key, def.default)))
        .collect();

    Json(values)
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub key: String,
    pub value: String,
}

/// Write one runtime setting.
///
/// Unknown keys are rejected before any state changes. A critical key
/// additionally invalidates the cached model-service clients.
pub async fn update_setting(
    State(state): State<ApiState>,
    Json(input): Json<UpdateSettingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(def) = schema::find(&input.key) else {
        return Err(ApiError::ValidationError(format!(
            "unknown setting key: {}",
            input.key
        )));
    };

    state.runtime.set(def.key, &input.value);

    if def.critical {
        state.model_services.invalidate();
    }

    info!(
        key = def.key,
        critical = def.critical,
        "runtime setting updated"
    );

    Ok(Json(json!({
        "status": "updated",
        "key": def.key,
        "invalidated": def.critical,
    })))
}

/// Rewrite every declared key to its schema default.
///
/// Not atomic across keys; a concurrent reader may observe a mix of old
/// and new values while the reset runs.
pub async fn reset_settings(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let keys_reset = schema::all_settings()
        .inspect(|def| state.runtime.set(def.key, def.default))
        .count();

    state.model_services.invalidate();
    info!(keys_reset, "runtime settings reset to defaults");

    Ok(Json(json!({
        "status": "reset",
        "keys_reset": keys_reset,
    })))
}
