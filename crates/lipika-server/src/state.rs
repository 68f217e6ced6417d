//! Shared application state

use std::sync::Arc;

use lipika_core::{ServerConfig, TransliterationService};
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TransliterationService>,
    /// Concurrency limiter for transliteration requests
    pub request_semaphore: Arc<Semaphore>,
    pub request_timeout_secs: u64,
}

impl AppState {
    pub fn new(service: Arc<TransliterationService>, config: &ServerConfig) -> Self {
        Self {
            service,
            request_semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            request_timeout_secs: config.request_timeout_secs,
        }
    }

    pub async fn acquire_permit(&self) -> Result<SemaphorePermit<'_>, ApiError> {
        self.request_semaphore
            .acquire()
            .await
            .map_err(|_| ApiError::unavailable("Server is shutting down"))
    }
}
