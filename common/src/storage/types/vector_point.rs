use uuid::Uuid;

use crate::stored_object;

stored_object!(VectorPoint, "vector_point", {
    job_id: String,
    chunk_index: u32,
    embedding: Vec<f32>,
    source_page: Option<u32>
});

impl VectorPoint {
    pub fn new(
        job_id: impl Into<String>,
        chunk_index: u32,
        embedding: Vec<f32>,
        source_page: Option<u32>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            job_id: job_id.into(),
            chunk_index,
            embedding,
            source_page,
        }
    }
}
