//! Vote submission and listing on top of a [`DocumentStore`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::{KaulError, Result};
use crate::reward::{DistributionReport, RewardEngine, VoteEvent};
use crate::store::DocumentStore;
use crate::types::{Subject, SubjectId, UserAccount, UserId, UserProfile, VoteType};
use crate::{INITIAL_POINTS, VOTE_COST};

/// Message returned with a successful vote.
pub const VOTE_RECORDED_MESSAGE: &str = "Vote recorded! Rewards distributed to previous voters.";

/// Point economics of voting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoteRules {
    /// Points paid per vote.
    pub vote_cost: f64,
    /// Starting balance of new accounts.
    pub initial_points: f64,
}

impl Default for VoteRules {
    fn default() -> Self {
        Self {
            vote_cost: VOTE_COST,
            initial_points: INITIAL_POINTS,
        }
    }
}

impl VoteRules {
    /// Set the vote cost.
    #[must_use]
    pub const fn with_vote_cost(mut self, vote_cost: f64) -> Self {
        self.vote_cost = vote_cost;
        self
    }

    /// Set the starting balance.
    #[must_use]
    pub const fn with_initial_points(mut self, initial_points: f64) -> Self {
        self.initial_points = initial_points;
        self
    }
}

/// Everything a client needs to render the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// All subjects.
    pub subjects: Vec<Subject>,
    /// All point accounts.
    pub users: BTreeMap<UserId, UserAccount>,
    /// Profile roster.
    pub user_profiles: Vec<UserProfile>,
}

/// Outcome of a successful vote.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    /// Subjects after the vote.
    pub subjects: Vec<Subject>,
    /// The voter's account after the vote.
    pub user: UserAccount,
    /// Rewards paid to earlier voters.
    pub report: DistributionReport,
}

/// Records votes and serves listings.
#[derive(Debug)]
pub struct VoteService<S> {
    store: S,
    engine: RewardEngine,
    rules: VoteRules,
}

impl<S: DocumentStore> VoteService<S> {
    /// Create a service. The engine's starting balance is aligned with
    /// `rules`.
    pub fn new(store: S, engine: RewardEngine, rules: VoteRules) -> Self {
        Self {
            store,
            engine: engine.with_initial_points(rules.initial_points),
            rules,
        }
    }

    /// Underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Voting rules in effect.
    pub const fn rules(&self) -> &VoteRules {
        &self.rules
    }

    /// Reward engine in use.
    pub const fn engine(&self) -> &RewardEngine {
        &self.engine
    }

    /// Read all subjects, accounts and profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if either document cannot be read.
    pub fn list(&self) -> Result<Listing> {
        let subjects = self.store.load_subjects()?;
        let users = self.store.load_users()?;
        Ok(Listing {
            subjects: subjects.subjects,
            users: users.points,
            user_profiles: users.profiles,
        })
    }

    /// Record a vote and pay rewards to earlier voters of the same type.
    ///
    /// Validation failures leave both documents untouched. The subjects
    /// document is written first; if the users write then fails, the
    /// previous subjects snapshot is written back.
    ///
    /// # Errors
    ///
    /// Returns a validation error (insufficient points, unknown subject,
    /// duplicate vote), a distribution error, or a store error.
    pub fn record_vote(
        &self,
        subject_id: SubjectId,
        vote_type: VoteType,
        user_id: &UserId,
    ) -> Result<VoteOutcome> {
        let cost = self.rules.vote_cost;
        let original_subjects = self.store.load_subjects()?;
        let mut subjects = original_subjects.clone();
        let mut users = self.store.load_users()?;

        let balance = users.get_or_create(user_id, self.rules.initial_points).points;
        if balance < cost {
            debug!(user = %user_id, balance, cost, "vote rejected: insufficient points");
            return Err(KaulError::insufficient_points(balance, cost));
        }

        let Some(subject) = subjects.find_mut(subject_id) else {
            debug!(subject = subject_id, "vote rejected: unknown subject");
            return Err(KaulError::SubjectNotFound { id: subject_id });
        };

        if subject.has_voted(user_id, vote_type) {
            debug!(user = %user_id, subject = subject_id, %vote_type, "vote rejected: duplicate");
            return Err(KaulError::DuplicateVote {
                user: user_id.clone(),
                subject: subject_id,
                vote_type,
            });
        }

        let now = Utc::now();
        users.get_or_create(user_id, self.rules.initial_points).points -= cost;
        let position = subject.push_vote(user_id.clone(), vote_type, cost, now);

        let event = VoteEvent {
            subject_id,
            vote_type,
            voter: user_id,
            cost,
        };
        let report = self.engine.apply(subject, &event, &mut users, now)?;

        self.store.save_subjects(&subjects)?;
        if let Err(e) = self.store.save_users(&users) {
            warn!(error = %e, "users write failed, restoring subjects snapshot");
            if let Err(restore) = self.store.save_subjects(&original_subjects) {
                warn!(error = %restore, "failed to restore subjects snapshot");
            }
            return Err(e);
        }

        info!(
            user = %user_id,
            subject = subject_id,
            %vote_type,
            position,
            rewarded = report.total,
            "vote recorded"
        );

        let user = users
            .account(user_id)
            .cloned()
            .unwrap_or_else(|| UserAccount::new(self.rules.initial_points));
        Ok(VoteOutcome {
            subjects: subjects.subjects,
            user,
            report,
        })
    }

    /// Overwrite both documents with the seed data.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails.
    pub fn reset(&self) -> Result<()> {
        crate::store::reset(&self.store)
    }
}
