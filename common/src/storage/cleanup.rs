use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;

use super::backends::JobDataBackend;

/// Outcome of one backend's share of a cleanup run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BackendOutcome {
    pub deleted: u64,
    pub error: Option<String>,
}

/// Aggregate of a best-effort cleanup across every configured backend.
///
/// `success` is true only when no backend reported an error; a failed
/// backend contributes zero deletions, never aborts the others.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupResult {
    pub job_id: String,
    pub success: bool,
    pub total_deleted: u64,
    pub services: BTreeMap<String, BackendOutcome>,
    pub errors: Vec<String>,
}

/// Read-only counterpart of [`CleanupResult`].
#[derive(Debug, Clone, Serialize)]
pub struct DataSummary {
    pub job_id: String,
    pub services: BTreeMap<String, u64>,
    pub total_items: u64,
}

/// Fans one job's deletion or inspection out across the configured
/// backends, isolating each backend's failure from the rest.
pub struct CleanupCoordinator {
    backends: Vec<Arc<dyn JobDataBackend>>,
}

impl CleanupCoordinator {
    pub fn new(backends: Vec<Arc<dyn JobDataBackend>>) -> Result<Self, AppError> {
        if backends.is_empty() {
            return Err(AppError::ServiceUnavailable(
                "cleanup coordinator has no backends configured".into(),
            ));
        }

        Ok(Self { backends })
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|backend| backend.name()).collect()
    }

    /// Delete the job's data from every backend, best-effort.
    ///
    /// Backends run in configuration order; errors are recorded per
    /// backend and in `errors`, in that same order. Deleting a job that
    /// left no data reports zero per backend and succeeds.
    pub async fn cleanup_job(&self, job_id: &str) -> CleanupResult {
        let mut services = BTreeMap::new();
        let mut errors = Vec::new();
        let mut total_deleted: u64 = 0;

        for backend in &self.backends {
            match backend.delete_job_data(job_id).await {
                Ok(deleted) => {
                    total_deleted = total_deleted.saturating_add(deleted);
                    services.insert(
                        backend.name().to_string(),
                        BackendOutcome {
                            deleted,
                            error: None,
                        },
                    );
                }
                Err(err) => {
                    let message = err.to_string();
                    warn!(
                        job_id = %job_id,
                        backend = backend.name(),
                        error = %message,
                        "backend cleanup failed"
                    );
                    services.insert(
                        backend.name().to_string(),
                        BackendOutcome {
                            deleted: 0,
                            error: Some(message.clone()),
                        },
                    );
                    errors.push(message);
                }
            }
        }

        let success = errors.is_empty();
        info!(
            job_id = %job_id,
            total_deleted,
            success,
            backend_errors = errors.len(),
            "job cleanup finished"
        );

        CleanupResult {
            job_id: job_id.to_string(),
            success,
            total_deleted,
            services,
            errors,
        }
    }

    /// Count the job's data in every backend without mutating anything.
    ///
    /// A backend that fails to answer contributes zero to the summary.
    pub async fn job_data_summary(&self, job_id: &str) -> DataSummary {
        let mut services = BTreeMap::new();
        let mut total_items: u64 = 0;

        for backend in &self.backends {
            let count = match backend.count_job_data(job_id).await {
                Ok(count) => count,
                Err(err) => {
                    warn!(
                        job_id = %job_id,
                        backend = backend.name(),
                        error = %err,
                        "backend count failed"
                    );
                    0
                }
            };
            total_items = total_items.saturating_add(count);
            services.insert(backend.name().to_string(), count);
        }

        DataSummary {
            job_id: job_id.to_string(),
            services,
            total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct MockBackend {
        name: &'static str,
        items: AtomicU64,
        fail: bool,
    }

    impl MockBackend {
        fn with_items(name: &'static str, items: u64) -> Arc<Self> {
            Arc::new(Self {
                name,
                items: AtomicU64::new(items),
                fail: false,
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                items: AtomicU64::new(0),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl JobDataBackend for MockBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn delete_job_data(&self, _job_id: &str) -> Result<u64, AppError> {
            if self.fail {
                return Err(AppError::InternalError("ConnectionError: refused".into()));
            }
            Ok(self.items.swap(0, Ordering::SeqCst))
        }

        async fn count_job_data(&self, _job_id: &str) -> Result<u64, AppError> {
            if self.fail {
                return Err(AppError::InternalError("ConnectionError: refused".into()));
            }
            Ok(self.items.load(Ordering::SeqCst))
        }
    }

    #[tokio::test]
    async fn test_cleanup_aggregates_all_backends() {
        let coordinator = CleanupCoordinator::new(vec![
            MockBackend::with_items("vector_index", 3),
            MockBackend::with_items("object_storage", 5),
            MockBackend::with_items("analytics", 2),
        ])
        .expect("coordinator");

        let result = coordinator.cleanup_job("job-42").await;

        assert!(result.success);
        assert_eq!(result.total_deleted, 10);
        assert_eq!(result.services.len(), 3);
        assert!(result.errors.is_empty());
        assert_eq!(
            result.services.get("object_storage"),
            Some(&BackendOutcome {
                deleted: 5,
                error: None
            })
        );
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let coordinator = CleanupCoordinator::new(vec![
            MockBackend::with_items("vector_index", 4),
            MockBackend::with_items("analytics", 1),
        ])
        .expect("coordinator");

        let first = coordinator.cleanup_job("job-42").await;
        let second = coordinator.cleanup_job("job-42").await;

        assert!(first.success);
        assert_eq!(first.total_deleted, 5);
        assert!(second.success);
        assert_eq!(second.total_deleted, 0);
        assert_eq!(second.services.len(), 2);
    }

    #[tokio::test]
    async fn test_one_failing_backend_does_not_stop_the_rest() {
        let coordinator = CleanupCoordinator::new(vec![
            MockBackend::failing("vector_index"),
            MockBackend::with_items("object_storage", 5),
            MockBackend::with_items("analytics", 2),
        ])
        .expect("coordinator");

        let result = coordinator.cleanup_job("abc").await;

        assert!(!result.success);
        assert_eq!(result.total_deleted, 7);
        assert_eq!(result.errors.len(), 1);
        assert!(result
            .errors
            .first()
            .is_some_and(|error| error.contains("ConnectionError")));
        assert_eq!(result.services.len(), 3);

        let vector = result.services.get("vector_index").expect("vector entry");
        assert_eq!(vector.deleted, 0);
        assert!(vector.error.as_deref().is_some_and(|e| e.contains("ConnectionError")));

        let object = result.services.get("object_storage").expect("object entry");
        assert_eq!(object.deleted, 5);
        assert!(object.error.is_none());
    }

    #[tokio::test]
    async fn test_summary_counts_without_mutating() {
        let coordinator = CleanupCoordinator::new(vec![
            MockBackend::with_items("vector_index", 3),
            MockBackend::failing("analytics"),
        ])
        .expect("coordinator");

        let summary = coordinator.job_data_summary("job-42").await;

        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.services.get("vector_index"), Some(&3));
        assert_eq!(summary.services.get("analytics"), Some(&0));

        // Counting twice returns the same numbers
        let again = coordinator.job_data_summary("job-42").await;
        assert_eq!(again.total_items, 3);
    }

    #[test]
    fn test_coordinator_requires_backends() {
        let result = CleanupCoordinator::new(Vec::new());
        assert!(matches!(result, Err(AppError::ServiceUnavailable(_))));
    }
}
