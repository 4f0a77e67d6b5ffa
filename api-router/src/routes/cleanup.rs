use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

use super::validate_job_id;

/// Best-effort removal of one job's data from every configured backend.
///
/// A partially failed run still reports the successful backends; the
/// response status flips to `completed_with_errors` instead of failing the
/// request.
pub async fn cleanup_job(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = validate_job_id(&id)?;
    let coordinator = state.cleanup.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("cleanup coordinator not initialized".to_string())
    })?;

    info!(job_id = %job_id, "received cleanup request");
    let result = coordinator.cleanup_job(job_id).await;

    let status = if result.success {
        "completed"
    } else {
        "completed_with_errors"
    };

    Ok(Json(json!({
        "job_id": result.job_id,
        "status": status,
        "total_deleted": result.total_deleted,
        "services": result.services,
        "errors": result.errors,
    })))
}
