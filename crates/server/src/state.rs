use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use facesearch::{build_service, AppConfig, PersonService};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Composed register/search pipeline (shared across requests)
    pub service: Arc<PersonService>,
}

impl ServerState {
    /// Create new server state from the two config layers.
    pub fn new(config: ServerConfig, app_config: AppConfig) -> ServerResult<Self> {
        let service = build_service(&app_config)
            .map_err(|e| ServerError::Config(format!("failed to build pipeline: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            service: Arc::new(service),
        })
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
