use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::AppError;
use crate::runtime_config::RuntimeConfig;

/// HTTP handle for one external model service.
#[derive(Clone)]
pub struct ModelEndpoint {
    pub base_url: String,
    pub http: reqwest::Client,
}

/// The long-lived clients the ingestion stages talk to.
#[derive(Clone)]
pub struct ModelClients {
    pub ocr: ModelEndpoint,
    pub embedding: ModelEndpoint,
}

/// Lazily-built cache of the model-service clients.
///
/// Clients embed values from [`RuntimeConfig`] (base URLs, request timeout)
/// at construction time, so a critical-key write must call [`invalidate`]
/// to force the next caller to rebuild them.
///
/// [`invalidate`]: ModelServices::invalidate
pub struct ModelServices {
    runtime: Arc<RuntimeConfig>,
    cached: Mutex<Option<Arc<ModelClients>>>,
}

impl ModelServices {
    pub fn new(runtime: Arc<RuntimeConfig>) -> Self {
        Self {
            runtime,
            cached: Mutex::new(None),
        }
    }

    /// Current client set, building it from runtime configuration on first
    /// use after startup or invalidation.
    pub fn clients(&self) -> Result<Arc<ModelClients>, AppError> {
        let mut guard = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(clients) = guard.as_ref() {
            return Ok(Arc::clone(clients));
        }

        let clients = Arc::new(self.build_clients()?);
        *guard = Some(Arc::clone(&clients));
        Ok(clients)
    }

    /// Drop the cached clients. The next [`clients`] call rebuilds them
    /// from the configuration values current at that point.
    ///
    /// [`clients`]: ModelServices::clients
    pub fn invalidate(&self) {
        let mut guard = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            tracing::info!("model service clients invalidated");
        }
    }

    fn build_clients(&self) -> Result<ModelClients, AppError> {
        let timeout_secs = self.runtime.get_int("MODEL_REQUEST_TIMEOUT_SECS", 120);
        let timeout = Duration::from_secs(timeout_secs.max(1) as u64);
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        let ocr_url = self
            .runtime
            .get("OCR_SERVICE_URL", "http://127.0.0.1:8601");
        let embedding_url = self
            .runtime
            .get("EMBEDDING_SERVICE_URL", "http://127.0.0.1:8602");

        tracing::debug!(
            ocr_url = %ocr_url,
            embedding_url = %embedding_url,
            timeout_secs,
            "building model service clients"
        );

        Ok(ModelClients {
            ocr: ModelEndpoint {
                base_url: ocr_url,
                http: http.clone(),
            },
            embedding: ModelEndpoint {
                base_url: embedding_url,
                http,
            },
        })
    }
}
