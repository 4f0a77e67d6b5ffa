use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;

use super::db::SurrealDbClient;
use super::store::StorageManager;
use super::types::{job_metric::JobMetric, vector_point::VectorPoint, StoredObject};

/// One independent store holding a disjoint slice of a job's data.
///
/// Implementations must scope both operations by job id: deleting or
/// counting a job that left no data is a normal zero outcome, not an error.
#[async_trait]
pub trait JobDataBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Remove every item belonging to the job, returning how many were
    /// removed.
    async fn delete_job_data(&self, job_id: &str) -> Result<u64, AppError>;

    /// Count the items currently stored for the job.
    async fn count_job_data(&self, job_id: &str) -> Result<u64, AppError>;
}

#[derive(Deserialize)]
struct CountRow {
    count: u64,
}

async fn delete_job_rows<T>(db: &SurrealDbClient, job_id: &str) -> Result<u64, AppError>
where
    T: StoredObject + Send + Sync + 'static,
{
    let mut result = db
        .client
        .query("DELETE FROM type::table($table) WHERE job_id = $job_id RETURN BEFORE")
        .bind(("table", T::table_name()))
        .bind(("job_id", job_id.to_string()))
        .await?;

    let deleted: Vec<T> = result.take(0)?;
    Ok(deleted.len() as u64)
}

async fn count_job_rows<T>(db: &SurrealDbClient, job_id: &str) -> Result<u64, AppError>
where
    T: StoredObject + Send + Sync + 'static,
{
    let mut result = db
        .client
        .query("SELECT count() AS count FROM type::table($table) WHERE job_id = $job_id GROUP ALL")
        .bind(("table", T::table_name()))
        .bind(("job_id", job_id.to_string()))
        .await?;

    let row: Option<CountRow> = result.take(0)?;
    Ok(row.map_or(0, |row| row.count))
}

/// Vector index rows produced by the embedding stage.
pub struct VectorIndexBackend {
    db: Arc<SurrealDbClient>,
}

impl VectorIndexBackend {
    pub fn new(db: Arc<SurrealDbClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobDataBackend for VectorIndexBackend {
    fn name(&self) -> &'static str {
        "vector_index"
    }

    async fn delete_job_data(&self, job_id: &str) -> Result<u64, AppError> {
        delete_job_rows::<VectorPoint>(&self.db, job_id).await
    }

    async fn count_job_data(&self, job_id: &str) -> Result<u64, AppError> {
        count_job_rows::<VectorPoint>(&self.db, job_id).await
    }
}

/// Raw document artifacts (page images, OCR output) below the job's
/// object-store prefix.
pub struct ObjectStorageBackend {
    storage: StorageManager,
}

impl ObjectStorageBackend {
    pub fn new(storage: StorageManager) -> Self {
        Self { storage }
    }

    fn job_prefix(job_id: &str) -> String {
        format!("jobs/{job_id}/")
    }
}

#[async_trait]
impl JobDataBackend for ObjectStorageBackend {
    fn name(&self) -> &'static str {
        "object_storage"
    }

    async fn delete_job_data(&self, job_id: &str) -> Result<u64, AppError> {
        let deleted = self.storage.delete_prefix(&Self::job_prefix(job_id)).await?;
        Ok(deleted as u64)
    }

    async fn count_job_data(&self, job_id: &str) -> Result<u64, AppError> {
        let count = self.storage.count_prefix(&Self::job_prefix(job_id)).await?;
        Ok(count as u64)
    }
}

/// Per-stage metrics recorded while the job ran.
pub struct AnalyticsBackend {
    db: Arc<SurrealDbClient>,
}

impl AnalyticsBackend {
    pub fn new(db: Arc<SurrealDbClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobDataBackend for AnalyticsBackend {
    fn name(&self) -> &'static str {
        "analytics"
    }

    async fn delete_job_data(&self, job_id: &str) -> Result<u64, AppError> {
        delete_job_rows::<JobMetric>(&self.db, job_id).await
    }

    async fn count_job_data(&self, job_id: &str) -> Result<u64, AppError> {
        count_job_rows::<JobMetric>(&self.db, job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::{AppConfig, StorageKind};
    use bytes::Bytes;
    use uuid::Uuid;

    async fn memory_db() -> SurrealDbClient {
        let namespace = "test_ns";
        let database = Uuid::new_v4().to_string();
        SurrealDbClient::memory(namespace, &database)
            .await
            .expect("in-memory surrealdb")
    }

    fn memory_storage_config() -> AppConfig {
        AppConfig {
            surrealdb_address: "test".into(),
            surrealdb_username: "test".into(),
            surrealdb_password: "test".into(),
            surrealdb_namespace: "test".into(),
            surrealdb_database: "test".into(),
            data_dir: "/tmp/unused".into(),
            http_port: 0,
            storage: StorageKind::Memory,
        }
    }

    #[tokio::test]
    async fn test_vector_index_backend_scopes_by_job() {
        let db = Arc::new(memory_db().await);
        for chunk_index in 0..3 {
            db.store_item(VectorPoint::new("job-a", chunk_index, vec![0.1, 0.2], None))
                .await
                .expect("store point");
        }
        db.store_item(VectorPoint::new("job-b", 0, vec![0.3, 0.4], Some(1)))
            .await
            .expect("store point");

        let backend = VectorIndexBackend::new(Arc::clone(&db));
        assert_eq!(backend.count_job_data("job-a").await.expect("count"), 3);

        let deleted = backend.delete_job_data("job-a").await.expect("delete");
        assert_eq!(deleted, 3);
        assert_eq!(backend.count_job_data("job-a").await.expect("count"), 0);
        assert_eq!(backend.count_job_data("job-b").await.expect("count"), 1);

        // Second pass finds nothing and still succeeds
        assert_eq!(backend.delete_job_data("job-a").await.expect("delete"), 0);
    }

    #[tokio::test]
    async fn test_analytics_backend_scopes_by_job() {
        let db = Arc::new(memory_db().await);
        db.store_item(JobMetric::new("job-a", "ocr", 1200, 10))
            .await
            .expect("store metric");
        db.store_item(JobMetric::new("job-a", "embed", 900, 10))
            .await
            .expect("store metric");

        let backend = AnalyticsBackend::new(Arc::clone(&db));
        assert_eq!(backend.count_job_data("job-a").await.expect("count"), 2);
        assert_eq!(backend.delete_job_data("job-a").await.expect("delete"), 2);
        assert_eq!(backend.count_job_data("job-a").await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_object_storage_backend_deletes_job_prefix_only() {
        let storage = StorageManager::new(&memory_storage_config())
            .await
            .expect("storage manager");
        storage
            .put("jobs/job-a/pages/0.png", Bytes::from_static(b"p0"))
            .await
            .expect("put");
        storage
            .put("jobs/job-a/ocr/0.json", Bytes::from_static(b"o0"))
            .await
            .expect("put");
        storage
            .put("jobs/job-b/pages/0.png", Bytes::from_static(b"b0"))
            .await
            .expect("put");

        let backend = ObjectStorageBackend::new(storage);
        assert_eq!(backend.count_job_data("job-a").await.expect("count"), 2);
        assert_eq!(backend.delete_job_data("job-a").await.expect("delete"), 2);
        assert_eq!(backend.count_job_data("job-a").await.expect("count"), 0);
        assert_eq!(backend.count_job_data("job-b").await.expect("count"), 1);
    }
}
