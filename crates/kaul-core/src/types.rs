//! Domain model: subjects, vote records, user accounts and the two
//! persisted documents.
//!
//! Field names serialize in camelCase so the documents stay readable by the
//! existing web front end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::KaulError;

/// Subject identifier.
pub type SubjectId = u64;

/// User identifier (e.g. `user1`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    /// Up vote.
    Up,
    /// Down vote.
    Down,
}

impl VoteType {
    /// Wire name of the vote type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = KaulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(KaulError::InvalidVoteType {
                value: s.to_string(),
            }),
        }
    }
}

/// Up/down tally of a subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    /// Number of up votes.
    pub up: u64,
    /// Number of down votes.
    pub down: u64,
}

impl VoteTally {
    /// Count for one vote type.
    #[must_use]
    pub const fn get(&self, vote_type: VoteType) -> u64 {
        match vote_type {
            VoteType::Up => self.up,
            VoteType::Down => self.down,
        }
    }

    /// Count one more vote of this type.
    pub fn increment(&mut self, vote_type: VoteType) {
        match vote_type {
            VoteType::Up => self.up += 1,
            VoteType::Down => self.down += 1,
        }
    }
}

/// One cast vote, as kept in a subject's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    /// Voter.
    pub user_id: UserId,
    /// When the vote was cast.
    pub timestamp: DateTime<Utc>,
    /// Points paid for the vote.
    pub points: f64,
    /// Vote direction.
    pub vote_type: VoteType,
    /// 1-based index among same-type votes on the subject when cast.
    pub position: u64,
}

/// A votable topic with its tally and ordered vote history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Subject identifier.
    pub id: SubjectId,
    /// Display title.
    pub title: String,
    /// Display icon.
    #[serde(default)]
    pub emoji: String,
    /// Vote tally.
    #[serde(default)]
    pub votes: VoteTally,
    /// Votes in arrival order.
    #[serde(default)]
    pub voter_history: Vec<VoteRecord>,
    /// Last time a vote changed this subject.
    pub last_updated: DateTime<Utc>,
}

impl Subject {
    /// Create a subject with no votes.
    #[must_use]
    pub fn new(
        id: SubjectId,
        title: impl Into<String>,
        emoji: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            emoji: emoji.into(),
            votes: VoteTally::default(),
            voter_history: Vec::new(),
            last_updated: now,
        }
    }

    /// Whether `user` already cast a vote of `vote_type` here.
    #[must_use]
    pub fn has_voted(&self, user: &UserId, vote_type: VoteType) -> bool {
        self.voter_history
            .iter()
            .any(|v| &v.user_id == user && v.vote_type == vote_type)
    }

    /// Append a vote, updating the tally and timestamp.
    ///
    /// Returns the position assigned to the new record.
    pub fn push_vote(
        &mut self,
        user: UserId,
        vote_type: VoteType,
        cost: f64,
        now: DateTime<Utc>,
    ) -> u64 {
        let position = self
            .voter_history
            .iter()
            .filter(|v| v.vote_type == vote_type)
            .count() as u64
            + 1;

        self.votes.increment(vote_type);
        self.last_updated = now;
        self.voter_history.push(VoteRecord {
            user_id: user,
            timestamp: now,
            points: cost,
            vote_type,
            position,
        });
        position
    }
}

/// The subjects document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectsDocument {
    /// All subjects.
    pub subjects: Vec<Subject>,
}

impl SubjectsDocument {
    /// Look up a subject.
    #[must_use]
    pub fn find(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    /// Look up a subject for mutation.
    pub fn find_mut(&mut self, id: SubjectId) -> Option<&mut Subject> {
        self.subjects.iter_mut().find(|s| s.id == id)
    }
}

/// One reward received by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardEntry {
    /// When the reward was paid.
    pub timestamp: DateTime<Utc>,
    /// Subject the rewarded vote was on. Written as a string; read from
    /// either a string or a number.
    #[serde(with = "subject_id_text")]
    pub subject_id: SubjectId,
    /// Points credited.
    pub amount: f64,
    /// Voter whose vote triggered the reward.
    pub from_user: UserId,
    /// Type of the rewarded vote.
    pub vote_type: VoteType,
    /// Position used to price the share.
    pub position: u64,
    /// Tier the position fell into, for tiered payouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<u8>,
}

mod subject_id_text {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::SubjectId;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(SubjectId),
        Text(String),
    }

    pub fn serialize<S: Serializer>(id: &SubjectId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SubjectId, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(id) => Ok(id),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| de::Error::custom(format!("invalid subject id {text:?}"))),
        }
    }
}

/// Points and reward bookkeeping for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Point balance.
    pub points: f64,
    /// Rewards received for up votes, per subject.
    #[serde(default)]
    pub up_vote_rewards: BTreeMap<SubjectId, f64>,
    /// Rewards received for down votes, per subject.
    #[serde(default)]
    pub down_vote_rewards: BTreeMap<SubjectId, f64>,
    /// Every reward received, oldest first.
    #[serde(default)]
    pub reward_history: Vec<RewardEntry>,
}

impl UserAccount {
    /// Create an account with the given starting balance.
    #[must_use]
    pub const fn new(initial_points: f64) -> Self {
        Self {
            points: initial_points,
            up_vote_rewards: BTreeMap::new(),
            down_vote_rewards: BTreeMap::new(),
            reward_history: Vec::new(),
        }
    }

    /// Per-subject reward totals for one vote type.
    #[must_use]
    pub const fn rewards(&self, vote_type: VoteType) -> &BTreeMap<SubjectId, f64> {
        match vote_type {
            VoteType::Up => &self.up_vote_rewards,
            VoteType::Down => &self.down_vote_rewards,
        }
    }

    /// Total reward received for `(subject, vote_type)`.
    #[must_use]
    pub fn reward_total(&self, subject: SubjectId, vote_type: VoteType) -> f64 {
        self.rewards(vote_type).get(&subject).copied().unwrap_or(0.0)
    }

    /// Credit a reward: balance, per-subject total and history.
    pub fn credit(&mut self, entry: RewardEntry) {
        let totals = match entry.vote_type {
            VoteType::Up => &mut self.up_vote_rewards,
            VoteType::Down => &mut self.down_vote_rewards,
        };
        *totals.entry(entry.subject_id).or_insert(0.0) += entry.amount;
        self.points += entry.amount;
        self.reward_history.push(entry);
    }
}

/// Display information for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Display avatar.
    pub avatar: String,
}

/// The users document: profile roster plus point accounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsersDocument {
    /// Known user profiles.
    #[serde(default)]
    pub profiles: Vec<UserProfile>,
    /// Point accounts keyed by user.
    #[serde(default)]
    pub points: BTreeMap<UserId, UserAccount>,
}

impl UsersDocument {
    /// Look up an account without creating it.
    #[must_use]
    pub fn account(&self, user: &UserId) -> Option<&UserAccount> {
        self.points.get(user)
    }

    /// Get the account for `user`, creating it with `initial_points` if it
    /// does not exist yet.
    pub fn get_or_create(&mut self, user: &UserId, initial_points: f64) -> &mut UserAccount {
        self.points
            .entry(user.clone())
            .or_insert_with(|| UserAccount::new(initial_points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    #[test_case("up", Some(VoteType::Up) ; "up")]
    #[test_case("down", Some(VoteType::Down) ; "down")]
    #[test_case("UP", None ; "case sensitive")]
    #[test_case("", None ; "empty")]
    fn test_vote_type_parse(input: &str, expected: Option<VoteType>) {
        assert_eq!(input.parse::<VoteType>().ok(), expected);
    }

    #[test]
    fn test_user_id_display_matches_str() {
        let id = UserId::new("user1");

        assert_eq!(id.to_string(), id.as_str());
        assert_eq!(serde_json::to_value(&id).expect("serialize"), "user1");
    }

    #[test]
    fn test_push_vote_positions_per_type() {
        let mut subject = Subject::new(1, "Kubernetes", "🚢", epoch());

        assert_eq!(subject.push_vote("u1".into(), VoteType::Up, 10.0, epoch()), 1);
        assert_eq!(subject.push_vote("u2".into(), VoteType::Down, 10.0, epoch()), 1);
        assert_eq!(subject.push_vote("u3".into(), VoteType::Up, 10.0, epoch()), 2);

        assert_eq!(subject.votes, VoteTally { up: 2, down: 1 });
        assert_eq!(subject.voter_history.len(), 3);
        assert!(subject.has_voted(&"u1".into(), VoteType::Up));
        assert!(!subject.has_voted(&"u1".into(), VoteType::Down));
    }

    #[test]
    fn test_get_or_create_is_lazy() {
        let mut users = UsersDocument::default();
        let id = UserId::from("user1");

        assert!(users.account(&id).is_none());
        users.get_or_create(&id, 100.0).points -= 10.0;
        assert!((users.get_or_create(&id, 100.0).points - 90.0).abs() < f64::EPSILON);
        assert_eq!(users.points.len(), 1);
    }

    #[test]
    fn test_credit_updates_totals_and_history() {
        let mut account = UserAccount::new(90.0);
        for amount in [5.0, 2.5] {
            account.credit(RewardEntry {
                timestamp: epoch(),
                subject_id: 3,
                amount,
                from_user: "u2".into(),
                vote_type: VoteType::Down,
                position: 1,
                tier: None,
            });
        }

        assert!((account.points - 97.5).abs() < f64::EPSILON);
        assert!((account.reward_total(3, VoteType::Down) - 7.5).abs() < f64::EPSILON);
        assert!(account.reward_total(3, VoteType::Up).abs() < f64::EPSILON);
        assert_eq!(account.reward_history.len(), 2);
    }

    #[test]
    fn test_document_wire_format() {
        let mut users = UsersDocument::default();
        users.get_or_create(&"user1".into(), 100.0).credit(RewardEntry {
            timestamp: epoch(),
            subject_id: 2,
            amount: 0.5,
            from_user: "user2".into(),
            vote_type: VoteType::Up,
            position: 1,
            tier: Some(1),
        });

        let json = serde_json::to_value(&users).expect("serialize");
        let account = &json["points"]["user1"];
        assert_eq!(account["points"], 100.5);
        assert_eq!(account["upVoteRewards"]["2"], 0.5);
        assert_eq!(account["rewardHistory"][0]["fromUser"], "user2");
        assert_eq!(account["rewardHistory"][0]["voteType"], "up");
        assert_eq!(account["rewardHistory"][0]["tier"], 1);
        assert_eq!(account["rewardHistory"][0]["subjectId"], "2");
    }

    #[test]
    fn test_reward_history_subject_id_text_or_number() {
        let json = r#"{
            "profiles": [{"id": "user1", "name": "Alice", "avatar": "a"}],
            "points": {
                "user1": {
                    "points": 95,
                    "upVoteRewards": {"1": 5},
                    "downVoteRewards": {},
                    "rewardHistory": [
                        {"timestamp": "2024-05-01T12:00:00.000Z", "subjectId": "1", "amount": 5,
                         "fromUser": "user2", "voteType": "up", "position": 1, "tier": 1},
                        {"timestamp": "2024-05-01T12:01:00.000Z", "subjectId": 4, "amount": 0.5,
                         "fromUser": "user3", "voteType": "down", "position": 2}
                    ]
                }
            }
        }"#;

        let users: UsersDocument = serde_json::from_str(json).expect("parse");
        let account = users.account(&"user1".into()).expect("account");

        assert_eq!(account.reward_history[0].subject_id, 1);
        assert_eq!(account.reward_history[0].tier, Some(1));
        assert_eq!(account.reward_history[1].subject_id, 4);
        assert!((account.reward_total(1, VoteType::Up) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reward_history_rejects_bad_subject_id() {
        let json = r#"{"timestamp":"2024-05-01T12:00:00Z","subjectId":"one","amount":1,
            "fromUser":"u2","voteType":"up","position":1}"#;

        assert!(serde_json::from_str::<RewardEntry>(json).is_err());
    }

    #[test]
    fn test_subject_tolerates_missing_history() {
        let json = r#"{"id":7,"title":"Legacy","votes":{"up":1,"down":0},"lastUpdated":"2024-01-01T00:00:00.000Z"}"#;
        let subject: Subject = serde_json::from_str(json).expect("parse");

        assert_eq!(subject.id, 7);
        assert!(subject.voter_history.is_empty());
        assert_eq!(subject.votes.get(VoteType::Up), 1);
    }
}
