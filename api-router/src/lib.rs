use api_state::ApiState;
use axum::{
    routing::{get, post},
    Router,
};
use routes::{
    cleanup::cleanup_job,
    jobs::{cancel_job, job_data_summary},
    liveness::live,
    progress::progress_stream,
    readiness::ready,
    settings::{get_settings_schema, get_settings_values, reset_settings, update_setting},
};

pub mod api_state;
pub mod error;
mod routes;

/// Router for the control-plane API, version 1
pub fn control_routes_v1() -> Router<ApiState> {
    // Public, unauthenticated endpoints (for k8s/systemd probes)
    let probes = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live));

    let jobs = Router::new()
        .route("/jobs/{id}/progress", get(progress_stream))
        .route("/jobs/{id}/cancel", post(cancel_job))
        .route("/jobs/{id}/data", get(job_data_summary))
        .route("/jobs/{id}/cleanup", post(cleanup_job));

    let settings = Router::new()
        .route("/settings/schema", get(get_settings_schema))
        .route("/settings/values", get(get_settings_values))
        .route("/settings/update", post(update_setting))
        .route("/settings/reset", post(reset_settings));

    probes.merge(jobs).merge(settings)
}
