use crate::application::ports::auth::AuthTokenProvider;
use crate::application::ports::remote_gateway::RemoteGateway;
use crate::application::sync::RetryPolicy;
use crate::infrastructure::remote::HttpRemoteGateway;
use crate::infrastructure::store::DocumentStore;
use crate::shared::config::AppConfig;
use crate::shared::error::{AppError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Ownership fields filled into upload payloads when a record was captured
/// without them (e.g. the technician signed in after working offline).
#[derive(Debug, Clone, Default)]
pub struct UploadDefaults {
    pub technician_id: Option<String>,
}

/// Everything a sync run needs, passed explicitly: no module-level
/// database handle, no token read from ambient storage.
#[derive(Clone)]
pub struct SyncContext {
    pub store: DocumentStore,
    pub gateway: Arc<dyn RemoteGateway>,
    pub defaults: UploadDefaults,
    pub retry: RetryPolicy,
}

impl SyncContext {
    pub fn new(store: DocumentStore, gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            store,
            gateway,
            defaults: UploadDefaults::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: UploadDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Wire the whole stack from configuration: open (and migrate) the
    /// local store, build the HTTP gateway with the injected token
    /// accessor, and derive the retry policy.
    pub async fn from_config(
        config: &AppConfig,
        auth: Arc<dyn AuthTokenProvider>,
    ) -> Result<Self> {
        config.validate().map_err(AppError::Configuration)?;
        let store =
            DocumentStore::connect(&config.database.url, config.database.max_connections).await?;
        store.migrate().await?;
        let gateway = HttpRemoteGateway::new(
            &config.api.base_url,
            Duration::from_secs(config.api.request_timeout),
            auth,
        )?;
        Ok(Self::new(store, Arc::new(gateway)).with_retry(RetryPolicy::from_config(&config.sync)))
    }
}
