//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use kaul_core::{RewardConfig, VoteRules};

/// Default address the API binds to.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Default directory holding `subjects.json` and `users.json`.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Configuration for the vote API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
    /// Directory holding the JSON documents.
    pub data_dir: PathBuf,
    /// Vote cost and starting balance.
    pub rules: VoteRules,
    /// Reward curve.
    pub reward: RewardConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000))),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            rules: VoteRules::default(),
            reward: RewardConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a configuration with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }

    /// Set the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the voting rules.
    #[must_use]
    pub const fn with_rules(mut self, rules: VoteRules) -> Self {
        self.rules = rules;
        self
    }

    /// Set the reward configuration.
    #[must_use]
    pub const fn with_reward(mut self, reward: RewardConfig) -> Self {
        self.reward = reward;
        self
    }
}
