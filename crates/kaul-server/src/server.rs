//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use kaul_core::JsonFileStore;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::routes::create_router;
use crate::state::{AppState, SharedStore};

/// HTTP server for the vote API.
#[derive(Debug, Clone)]
pub struct KaulServer {
    state: Arc<AppState>,
}

impl KaulServer {
    /// Create a server backed by JSON files in `config.data_dir`.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let store: SharedStore = Arc::new(JsonFileStore::new(&config.data_dir));
        Self::with_store(config, store)
    }

    /// Create a server over an existing store.
    #[must_use]
    pub fn with_store(config: ServerConfig, store: SharedStore) -> Self {
        Self {
            state: Arc::new(AppState::new(config, store)),
        }
    }

    /// Get the shared state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Start the server and listen for connections.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve(&self, addr: SocketAddr) -> ApiResult<()> {
        self.serve_with_shutdown(addr, std::future::pending()).await
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server shuts down when `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve_with_shutdown<F>(&self, addr: SocketAddr, shutdown: F) -> ApiResult<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::BindFailed(addr, e))?;

        let config = self.state.config();
        info!(
            addr = %addr,
            data_dir = %config.data_dir.display(),
            policy = ?config.reward.policy,
            basis = ?config.reward.basis,
            vote_cost = config.rules.vote_cost,
            "Vote API listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        info!("Vote API shut down");
        Ok(())
    }

    /// Create the router without starting the server.
    pub fn router(&self) -> axum::Router {
        create_router(self.state.clone())
    }
}
