pub mod cleanup;
pub mod jobs;
pub mod liveness;
pub mod progress;
pub mod readiness;
pub mod settings;

use crate::error::ApiError;

/// Job ids arrive as opaque path segments; the only invalid one is blank.
pub(crate) fn validate_job_id(id: &str) -> Result<&str, ApiError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::ValidationError("job id must not be blank".into()));
    }
    Ok(trimmed)
}
