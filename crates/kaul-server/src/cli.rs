//! Command-line argument parsing with clap.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kaul_core::reward::DEFAULT_MIN_REWARD;
use kaul_core::{PositionBasis, RewardConfig, RewardPolicy, VoteRules, INITIAL_POINTS, VOTE_COST};

use crate::config::{ServerConfig, DEFAULT_BIND_ADDR, DEFAULT_DATA_DIR};

/// Kaul - vote on subjects, reward early voters.
#[derive(Parser, Debug, Clone)]
#[command(name = "kaul")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format.
    #[arg(long, value_enum, env = "KAUL_LOG_FORMAT", default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),

    /// Rewrite both documents with the seed data.
    Reset(ResetArgs),
}

/// Reward curve options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// cost / 2^position.
    Halving,
    /// Flat rate per position band.
    Tiered,
}

impl From<PolicyArg> for RewardPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Halving => Self::GeometricHalving,
            PolicyArg::Tiered => Self::Tiered,
        }
    }
}

/// Position numbering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BasisArg {
    /// Index among prior voters of the same type.
    SameType,
    /// Index in the subject's full vote history.
    History,
}

impl From<BasisArg> for PositionBasis {
    fn from(arg: BasisArg) -> Self {
        match arg {
            BasisArg::SameType => Self::SameType,
            BasisArg::History => Self::History,
        }
    }
}

/// Arguments for the serve command.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(short, long, env = "KAUL_BIND", default_value = DEFAULT_BIND_ADDR)]
    pub bind: SocketAddr,

    /// Directory holding subjects.json and users.json.
    #[arg(short, long, env = "KAUL_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Reward curve.
    #[arg(long, value_enum, env = "KAUL_REWARD_POLICY", default_value_t = PolicyArg::Halving)]
    pub policy: PolicyArg,

    /// Position numbering fed to the reward curve.
    #[arg(long, value_enum, env = "KAUL_POSITION_BASIS", default_value_t = BasisArg::SameType)]
    pub position_basis: BasisArg,

    /// Points paid per vote.
    #[arg(long, env = "KAUL_VOTE_COST", default_value_t = VOTE_COST)]
    pub vote_cost: f64,

    /// Starting balance of new accounts.
    #[arg(long, env = "KAUL_INITIAL_POINTS", default_value_t = INITIAL_POINTS)]
    pub initial_points: f64,

    /// Shares below this stop a distribution pass.
    #[arg(long, env = "KAUL_MIN_REWARD", default_value_t = DEFAULT_MIN_REWARD)]
    pub min_reward: f64,
}

impl ServeArgs {
    /// Build the server configuration.
    #[must_use]
    pub fn to_config(&self) -> ServerConfig {
        ServerConfig::new(self.bind)
            .with_data_dir(self.data_dir.clone())
            .with_rules(
                VoteRules::default()
                    .with_vote_cost(self.vote_cost)
                    .with_initial_points(self.initial_points),
            )
            .with_reward(
                RewardConfig::new(self.policy.into())
                    .with_basis(self.position_basis.into())
                    .with_min_reward(self.min_reward),
            )
    }
}

/// Arguments for the reset command.
#[derive(Args, Debug, Clone)]
pub struct ResetArgs {
    /// Directory holding subjects.json and users.json.
    #[arg(short, long, env = "KAUL_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,
}
