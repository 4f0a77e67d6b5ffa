use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

use super::validate_job_id;

/// Request cooperative cancellation of a running job.
///
/// Only sets the job's flag; stages observe it at their next checkpoint
/// and wind down themselves.
pub async fn cancel_job(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = validate_job_id(&id)?;

    if !state.cancellations.cancel(job_id) {
        return Err(ApiError::NotFound(format!(
            "no active job with id {job_id}"
        )));
    }

    info!(job_id = %job_id, "cancellation flag set");
    Ok(Json(json!({
        "status": "cancellation_requested",
        "job_id": job_id,
    })))
}

/// Per-backend item counts for one job's stored data.
pub async fn job_data_summary(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = validate_job_id(&id)?;
    let coordinator = state.cleanup.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("cleanup coordinator not initialized".to_string())
    })?;

    let summary = coordinator.job_data_summary(job_id).await;
    Ok(Json(summary))
}
