//! Shared state for the API server.

use std::sync::Arc;
use std::time::Instant;

use kaul_core::{DocumentStore, RewardEngine, VoteService};
use tokio::sync::Mutex;

use crate::config::ServerConfig;

/// Store handle shared between the service and its owner.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Shared state for the API server.
///
/// The vote service sits behind one mutex so each request's
/// read-modify-write cycle completes before the next begins. Handlers take
/// an owned guard and run the service on the blocking pool, since the file
/// store does synchronous I/O.
#[derive(Debug)]
pub struct AppState {
    /// Server configuration.
    config: Arc<ServerConfig>,
    /// Vote service over the document store.
    service: Arc<Mutex<VoteService<SharedStore>>>,
    /// Server start time.
    start_time: Instant,
}

impl AppState {
    /// Create state over `store`.
    pub fn new(config: ServerConfig, store: SharedStore) -> Self {
        let engine = RewardEngine::new(config.reward);
        let service = VoteService::new(store, engine, config.rules);
        Self {
            config: Arc::new(config),
            service: Arc::new(Mutex::new(service)),
            start_time: Instant::now(),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the vote service.
    #[must_use]
    pub const fn service(&self) -> &Arc<Mutex<VoteService<SharedStore>>> {
        &self.service
    }

    /// Get server uptime in seconds.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
