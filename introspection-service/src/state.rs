//! Application state for introspection service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::service::IntrospectionService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub introspection: Arc<IntrospectionService>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: AppConfig) -> Self {
        Self {
            introspection: Arc::new(IntrospectionService::from_config(&config)),
            config,
        }
    }
}
