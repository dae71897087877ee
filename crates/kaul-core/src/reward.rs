//! Reward distribution.
//!
//! When a vote of type T lands on a subject, earlier voters of type T on the
//! same subject (excluding the new voter) each receive a share of the vote
//! cost. The share depends only on the voter's position in that ordered list
//! and the configured [`RewardPolicy`]:
//!
//! - [`RewardPolicy::GeometricHalving`]: `cost / 2^position`. The series
//!   converges, so the total paid is always below the cost.
//! - [`RewardPolicy::Tiered`]: a flat rate per position band, see
//!   [`REWARD_TIERS`]. The bands sum to 9.977 for a cost of 10 but the total
//!   is not checked at runtime.
//!
//! Iteration stops as soon as a share drops below the configured minimum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{KaulError, Result};
use crate::store::DocumentStore;
use crate::types::{RewardEntry, Subject, SubjectId, UserId, UsersDocument, VoteType};
use crate::INITIAL_POINTS;

/// Default share below which distribution stops.
pub const DEFAULT_MIN_REWARD: f64 = 0.000_001;

/// A band of positions sharing one flat reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    /// Last position (inclusive) in this band.
    pub max_position: u64,
    /// Reward paid to each position in the band.
    pub reward: f64,
}

/// Position bands of the tiered policy. Positions past the last band get 0.
pub const REWARD_TIERS: [Tier; 4] = [
    Tier {
        max_position: 10,
        reward: 0.5,
    },
    Tier {
        max_position: 100,
        reward: 0.033,
    },
    Tier {
        max_position: 1_000,
        reward: 0.001_67,
    },
    Tier {
        max_position: 10_000,
        reward: 0.000_056,
    },
];

/// How a prior voter's share is priced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardPolicy {
    /// `cost / 2^position`.
    #[default]
    GeometricHalving,
    /// Flat rate per position band.
    Tiered,
}

impl RewardPolicy {
    /// Share paid to the voter at `position` (1-based).
    #[must_use]
    pub fn share(&self, position: u64, cost: f64) -> f64 {
        match self {
            Self::GeometricHalving => {
                let exponent = i32::try_from(position).unwrap_or(i32::MAX);
                cost * 0.5_f64.powi(exponent)
            }
            Self::Tiered => Self::tier_index(position).map_or(0.0, |i| REWARD_TIERS[i].reward),
        }
    }

    /// Tier number (1-based) for `position`, if the policy is tiered and the
    /// position falls inside a band.
    #[must_use]
    pub fn tier(&self, position: u64) -> Option<u8> {
        match self {
            Self::GeometricHalving => None,
            Self::Tiered => Self::tier_index(position).and_then(|i| u8::try_from(i + 1).ok()),
        }
    }

    fn tier_index(position: u64) -> Option<usize> {
        REWARD_TIERS
            .iter()
            .position(|tier| position <= tier.max_position)
    }
}

/// What "position" means when pricing a share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionBasis {
    /// Index in the filtered list of prior same-type voters.
    #[default]
    SameType,
    /// Index of the vote record in the subject's full history.
    History,
}

/// Reward engine configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardConfig {
    /// Share pricing.
    pub policy: RewardPolicy,
    /// Position numbering fed to the policy.
    pub basis: PositionBasis,
    /// Shares below this stop the distribution pass.
    pub min_reward: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            policy: RewardPolicy::default(),
            basis: PositionBasis::default(),
            min_reward: DEFAULT_MIN_REWARD,
        }
    }
}

impl RewardConfig {
    /// Create a configuration for `policy` with default basis and minimum.
    #[must_use]
    pub fn new(policy: RewardPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Set the position basis.
    #[must_use]
    pub const fn with_basis(mut self, basis: PositionBasis) -> Self {
        self.basis = basis;
        self
    }

    /// Set the minimum share.
    #[must_use]
    pub const fn with_min_reward(mut self, min_reward: f64) -> Self {
        self.min_reward = min_reward;
        self
    }
}

/// One share paid to a prior voter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    /// Rewarded voter.
    pub recipient: UserId,
    /// Position used for pricing.
    pub position: u64,
    /// Points credited.
    pub amount: f64,
    /// Tier, for tiered payouts.
    pub tier: Option<u8>,
}

/// Result of one distribution pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionReport {
    /// Subject the triggering vote was cast on.
    pub subject_id: SubjectId,
    /// Type of the triggering vote.
    pub vote_type: VoteType,
    /// Voter who triggered the distribution.
    pub source: UserId,
    /// Shares paid, in position order.
    pub payouts: Vec<Payout>,
    /// Sum of all shares.
    pub total: f64,
}

impl DistributionReport {
    fn empty(subject_id: SubjectId, vote_type: VoteType, source: &UserId) -> Self {
        Self {
            subject_id,
            vote_type,
            source: source.clone(),
            payouts: Vec::new(),
            total: 0.0,
        }
    }

    /// Whether nothing was paid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payouts.is_empty()
    }
}

/// A vote that triggers reward distribution.
#[derive(Debug, Clone, Copy)]
pub struct VoteEvent<'a> {
    /// Subject voted on.
    pub subject_id: SubjectId,
    /// Vote direction.
    pub vote_type: VoteType,
    /// The new voter.
    pub voter: &'a UserId,
    /// Points paid for the vote.
    pub cost: f64,
}

/// Computes and applies reward shares.
#[derive(Debug, Clone)]
pub struct RewardEngine {
    config: RewardConfig,
    initial_points: f64,
}

impl Default for RewardEngine {
    fn default() -> Self {
        Self::new(RewardConfig::default())
    }
}

impl RewardEngine {
    /// Create an engine. Accounts created for rewarded voters start with
    /// [`INITIAL_POINTS`].
    #[must_use]
    pub const fn new(config: RewardConfig) -> Self {
        Self {
            config,
            initial_points: INITIAL_POINTS,
        }
    }

    /// Set the starting balance of lazily created accounts.
    #[must_use]
    pub const fn with_initial_points(mut self, initial_points: f64) -> Self {
        self.initial_points = initial_points;
        self
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Price the shares owed to prior voters without touching any account.
    ///
    /// # Errors
    ///
    /// Returns an error if the cost is negative or not finite.
    pub fn plan(&self, subject: &Subject, event: &VoteEvent<'_>) -> Result<Vec<Payout>> {
        if !event.cost.is_finite() || event.cost < 0.0 {
            return Err(KaulError::invalid_amount(format!(
                "vote cost must be a non-negative number, got {}",
                event.cost
            )));
        }

        let prior = subject
            .voter_history
            .iter()
            .enumerate()
            .filter(|(_, v)| v.vote_type == event.vote_type && &v.user_id != event.voter);

        let mut payouts = Vec::new();
        for (same_type_index, (history_index, vote)) in prior.enumerate() {
            let position = match self.config.basis {
                PositionBasis::SameType => same_type_index as u64 + 1,
                PositionBasis::History => history_index as u64 + 1,
            };
            let amount = self.config.policy.share(position, event.cost);
            if !amount.is_finite() {
                return Err(KaulError::distribution(format!(
                    "share for position {position} is not finite"
                )));
            }
            if amount < self.config.min_reward {
                debug!(position, amount, "share below minimum, stopping distribution");
                break;
            }
            payouts.push(Payout {
                recipient: vote.user_id.clone(),
                position,
                amount,
                tier: self.config.policy.tier(position),
            });
        }
        Ok(payouts)
    }

    /// Distribute rewards for `event` into `users`.
    ///
    /// `subject` must already contain the new vote (or not; the new voter is
    /// excluded either way). On error `users` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the shares cannot be priced.
    pub fn apply(
        &self,
        subject: &Subject,
        event: &VoteEvent<'_>,
        users: &mut UsersDocument,
        now: DateTime<Utc>,
    ) -> Result<DistributionReport> {
        let mut report = DistributionReport::empty(event.subject_id, event.vote_type, event.voter);
        let payouts = self.plan(subject, event)?;

        for payout in &payouts {
            users
                .get_or_create(&payout.recipient, self.initial_points)
                .credit(RewardEntry {
                    timestamp: now,
                    subject_id: event.subject_id,
                    amount: payout.amount,
                    from_user: event.voter.clone(),
                    vote_type: event.vote_type,
                    position: payout.position,
                    tier: payout.tier,
                });
            debug!(
                recipient = %payout.recipient,
                position = payout.position,
                amount = payout.amount,
                "reward credited"
            );
            report.total += payout.amount;
        }
        report.payouts = payouts;

        info!(
            subject = event.subject_id,
            vote_type = %event.vote_type,
            voter = %event.voter,
            recipients = report.payouts.len(),
            total = report.total,
            cost = event.cost,
            "rewards distributed"
        );
        Ok(report)
    }

    /// Load the documents from `store`, distribute rewards for `event`, and
    /// write the users document back in one snapshot.
    ///
    /// An unknown subject or an empty prior-voter list is a no-op and nothing
    /// is written. If the write fails the in-memory changes are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, pricing or the final write fails.
    pub fn distribute(
        &self,
        store: &dyn DocumentStore,
        event: &VoteEvent<'_>,
    ) -> Result<DistributionReport> {
        let subjects = store.load_subjects()?;
        let Some(subject) = subjects.find(event.subject_id) else {
            debug!(subject = event.subject_id, "subject not found, nothing to distribute");
            return Ok(DistributionReport::empty(
                event.subject_id,
                event.vote_type,
                event.voter,
            ));
        };

        let mut users = store.load_users()?;
        let report = self.apply(subject, event, &mut users, Utc::now())?;
        if !report.is_empty() {
            store.save_users(&users)?;
        }
        Ok(report)
    }
}
