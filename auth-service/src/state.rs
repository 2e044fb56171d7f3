//! Application state for auth service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::repository::UserRepository;
use crate::service::AuthService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Creates a new application state backed by `repo`.
    pub fn new(config: AppConfig, repo: Arc<dyn UserRepository>) -> Self {
        Self {
            auth: Arc::new(AuthService::new(repo, config.jwt.clone())),
            config,
        }
    }
}
