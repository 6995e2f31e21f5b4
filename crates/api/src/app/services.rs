use std::sync::Arc;

use jobboard_infra::job_store::PgConnector;
use jobboard_infra::workers::WorkerHandle;
use jobboard_infra::{InMemoryJobStore, JobStore, PostgresJobStore, RetentionPolicy, RetentionSweeper};

use crate::config::Config;

/// Shared application services, injected into handlers via `Extension`.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn JobStore>,
    backend: &'static str,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl AppServices {
    pub fn new(store: Arc<dyn JobStore>, backend: &'static str) -> Self {
        Self { store, backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryJobStore::new()), "memory")
    }

    /// Choose the backend from configuration.
    ///
    /// The Postgres pool is not opened here; the first request (or sweep)
    /// establishes it.
    pub fn from_config(config: &Config) -> Self {
        match &config.database_url {
            Some(url) => {
                let connector = PgConnector::new(url.clone(), config.database_max_connections);
                tracing::info!(max_connections = config.database_max_connections, "using postgres job store");
                Self::new(Arc::new(PostgresJobStore::new(connector)), "postgres")
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory job store (data is lost on restart)");
                Self::in_memory()
            }
        }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Start the periodic retention sweep against this service's store.
    pub fn spawn_retention_sweeper(&self, policy: RetentionPolicy) -> WorkerHandle {
        RetentionSweeper::spawn(Arc::clone(&self.store), policy)
    }
}
