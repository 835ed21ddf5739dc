use std::sync::Arc;

use crate::{
    backend::BackendClient,
    config::Config,
    error::AppError,
    guard::RouteGuard,
    session::SessionSigner,
};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: BackendClient,
    pub signer: SessionSigner,
    pub guard: Arc<RouteGuard>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let backend = BackendClient::new(&config)?;
        let signer = SessionSigner::new(&config.secret_key, config.session_ttl_secs);

        Ok(Self {
            config: Arc::new(config),
            backend,
            signer,
            guard: Arc::new(RouteGuard::default()),
        })
    }

    pub fn with_guard(mut self, guard: RouteGuard) -> Self {
        self.guard = Arc::new(guard);
        self
    }
}
