use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{path::Path as ObjPath, ObjectStore};

use crate::utils::config::{AppConfig, StorageKind};

pub type DynStore = Arc<dyn ObjectStore>;

/// Object-storage manager holding the process-wide store handle.
///
/// All job artifacts live below a per-job prefix, so deletion and counting
/// are prefix operations.
#[derive(Clone)]
pub struct StorageManager {
    store: DynStore,
    backend_kind: StorageKind,
}

impl StorageManager {
    /// Create a new StorageManager with the backend selected by the
    /// bootstrap configuration.
    pub async fn new(cfg: &AppConfig) -> object_store::Result<Self> {
        let backend_kind = cfg.storage.clone();
        let store = create_storage_backend(cfg).await?;

        Ok(Self {
            store,
            backend_kind,
        })
    }

    /// Create a StorageManager with a custom storage backend.
    ///
    /// This method is useful for testing scenarios where you want to inject
    /// a specific storage backend.
    pub fn with_backend(store: DynStore, backend_kind: StorageKind) -> Self {
        Self {
            store,
            backend_kind,
        }
    }

    pub fn backend_kind(&self) -> &StorageKind {
        &self.backend_kind
    }

    /// Store bytes at the specified location.
    pub async fn put(&self, location: &str, data: Bytes) -> object_store::Result<()> {
        let path = ObjPath::from(location);
        let payload = object_store::PutPayload::from_bytes(data);
        self.store.put(&path, payload).await.map(|_| ())
    }

    /// Retrieve bytes from the specified location.
    ///
    /// Returns the full contents buffered in memory.
    pub async fn get(&self, location: &str) -> object_store::Result<Bytes> {
        let path = ObjPath::from(location);
        let result = self.store.get(&path).await?;
        result.bytes().await
    }

    /// Delete all objects below the specified prefix, returning how many
    /// objects were removed. A prefix matching nothing deletes zero and
    /// succeeds.
    pub async fn delete_prefix(&self, prefix: &str) -> object_store::Result<usize> {
        let prefix_path = ObjPath::from(prefix);
        let locations: Vec<ObjPath> = self
            .store
            .list(Some(&prefix_path))
            .map_ok(|meta| meta.location)
            .try_collect()
            .await?;
        let count = locations.len();

        self.store
            .delete_stream(futures::stream::iter(locations.into_iter().map(Ok)).boxed())
            .try_collect::<Vec<_>>()
            .await?;

        Ok(count)
    }

    /// List all objects below the specified prefix.
    pub async fn list(
        &self,
        prefix: Option<&str>,
    ) -> object_store::Result<Vec<object_store::ObjectMeta>> {
        let prefix_path = prefix.map(ObjPath::from);
        self.store.list(prefix_path.as_ref()).try_collect().await
    }

    /// Number of objects below the specified prefix.
    pub async fn count_prefix(&self, prefix: &str) -> object_store::Result<usize> {
        Ok(self.list(Some(prefix)).await?.len())
    }

    /// Check if an object exists at the specified location.
    pub async fn exists(&self, location: &str) -> object_store::Result<bool> {
        let path = ObjPath::from(location);
        self.store
            .head(&path)
            .await
            .map(|_| true)
            .or_else(|e| match e {
                object_store::Error::NotFound { .. } => Ok(false),
                _ => Err(e),
            })
    }
}

/// Create a storage backend based on configuration.
async fn create_storage_backend(cfg: &AppConfig) -> object_store::Result<DynStore> {
    match cfg.storage {
        StorageKind::Local => {
            let base = resolve_base_dir(cfg);
            if !base.exists() {
                tokio::fs::create_dir_all(&base).await.map_err(|e| {
                    object_store::Error::Generic {
                        store: "LocalFileSystem",
                        source: e.into(),
                    }
                })?;
            }
            let store = LocalFileSystem::new_with_prefix(base)?;
            Ok(Arc::new(store))
        }
        StorageKind::Memory => {
            let store = InMemory::new();
            Ok(Arc::new(store))
        }
    }
}

/// Resolve the absolute base directory used for local storage from config.
///
/// If `data_dir` is relative, it is resolved against the current working directory.
pub fn resolve_base_dir(cfg: &AppConfig) -> PathBuf {
    if cfg.data_dir.starts_with('/') {
        PathBuf::from(&cfg.data_dir)
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(&cfg.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn test_config_memory() -> AppConfig {
        AppConfig {
            surrealdb_address: "test".into(),
            surrealdb_username: "test".into(),
            surrealdb_password: "test".into(),
            surrealdb_namespace: "test".into(),
            surrealdb_database: "test".into(),
            data_dir: "/tmp/unused".into(), // Ignored for memory storage
            http_port: 0,
            storage: StorageKind::Memory,
        }
    }

    #[tokio::test]
    async fn test_storage_manager_memory_basic_operations() {
        let cfg = test_config_memory();
        let storage = StorageManager::new(&cfg)
            .await
            .expect("create storage manager");

        let location = "jobs/job-1/pages/0.json";
        let data = b"page payload";

        storage
            .put(location, Bytes::from(data.to_vec()))
            .await
            .expect("put");
        let retrieved = storage.get(location).await.expect("get");
        assert_eq!(retrieved.as_ref(), data);

        assert!(storage.exists(location).await.expect("exists check"));

        let deleted = storage.delete_prefix("jobs/job-1/").await.expect("delete");
        assert_eq!(deleted, 1);
        assert!(!storage
            .exists(location)
            .await
            .expect("exists check after delete"));
    }

    #[tokio::test]
    async fn test_delete_prefix_reports_zero_for_unmatched_prefix() {
        let cfg = test_config_memory();
        let storage = StorageManager::new(&cfg)
            .await
            .expect("create storage manager");

        let deleted = storage
            .delete_prefix("jobs/never-created/")
            .await
            .expect("delete unmatched prefix");
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn test_list_and_count_are_prefix_scoped() {
        let cfg = test_config_memory();
        let storage = StorageManager::new(&cfg)
            .await
            .expect("create storage manager");

        let files = [
            ("jobs/job-a/pages/0.json", b"a0" as &[u8]),
            ("jobs/job-a/pages/1.json", b"a1"),
            ("jobs/job-b/pages/0.json", b"b0"),
        ];
        for (location, data) in &files {
            storage
                .put(location, Bytes::from(data.to_vec()))
                .await
                .expect("put");
        }

        let all_files = storage.list(None).await.expect("list all");
        assert_eq!(all_files.len(), 3);

        let job_a = storage.list(Some("jobs/job-a/")).await.expect("list job-a");
        assert_eq!(job_a.len(), 2);

        assert_eq!(
            storage.count_prefix("jobs/job-b/").await.expect("count"),
            1
        );
        assert_eq!(
            storage
                .count_prefix("jobs/nonexistent/")
                .await
                .expect("count empty"),
            0
        );
    }

    #[tokio::test]
    async fn test_storage_manager_with_custom_backend() {
        use object_store::memory::InMemory;

        let custom_store = InMemory::new();
        let storage = StorageManager::with_backend(Arc::new(custom_store), StorageKind::Memory);

        let location = "custom/test.txt";
        let data = b"custom backend test";

        storage
            .put(location, Bytes::from(data.to_vec()))
            .await
            .expect("put");
        let retrieved = storage.get(location).await.expect("get");
        assert_eq!(retrieved.as_ref(), data);

        assert!(storage.exists(location).await.expect("exists"));
        assert_eq!(*storage.backend_kind(), StorageKind::Memory);
    }
}
