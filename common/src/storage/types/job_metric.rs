use uuid::Uuid;

use crate::stored_object;

stored_object!(JobMetric, "job_metric", {
    job_id: String,
    stage: String,
    duration_ms: u64,
    items_processed: u32
});

impl JobMetric {
    pub fn new(
        job_id: impl Into<String>,
        stage: impl Into<String>,
        duration_ms: u64,
        items_processed: u32,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            job_id: job_id.into(),
            stage: stage.into(),
            duration_ms,
            items_processed,
        }
    }
}
