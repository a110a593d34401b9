//! Shared application state for the web server.

use std::sync::Arc;

use primerwatch_client::{RpcClient, TaxonomyClient};
use primerwatch_common::backend::{AuthProvider, SurveillanceBackend};
use primerwatch_config::Config;

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn SurveillanceBackend>,
    pub auth: Arc<dyn AuthProvider>,
    pub taxonomy: Arc<TaxonomyClient>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        backend: Arc<dyn SurveillanceBackend>,
        auth: Arc<dyn AuthProvider>,
        taxonomy: Arc<TaxonomyClient>,
    ) -> Self {
        Self { backend, auth, taxonomy, config: Arc::new(config) }
    }

    /// Build the HTTP clients described by `config`.
    pub fn connect(config: Config) -> anyhow::Result<Self> {
        let rpc = Arc::new(RpcClient::new(&config.backend)?);
        let taxonomy = Arc::new(TaxonomyClient::new(&config.taxonomy)?);
        Ok(Self::new(config, rpc.clone(), rpc, taxonomy))
    }

    /// Fan-out width for bulk actions.
    pub fn concurrency(&self) -> usize {
        self.config.bulk.concurrency.max(1)
    }
}

pub type SharedState = Arc<AppState>;
