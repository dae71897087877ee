//! # kaul-core
//!
//! Point-based voting with rewards for early voters.
//!
//! Every vote costs a fixed number of points. When a vote of type T lands on
//! a subject, the users who voted T on that subject earlier receive a share
//! of the cost, priced by position (see [`reward`]).
//!
//! ## Example
//!
//! ```rust
//! use kaul_core::{MemoryStore, RewardEngine, UserId, VoteRules, VoteService, VoteType};
//!
//! # fn example() -> kaul_core::Result<()> {
//! let service = VoteService::new(MemoryStore::seeded(), RewardEngine::default(), VoteRules::default());
//!
//! service.record_vote(1, VoteType::Up, &UserId::from("user1"))?;
//! let outcome = service.record_vote(1, VoteType::Up, &UserId::from("user2"))?;
//!
//! // user1 was first, so it gets cost / 2
//! assert_eq!(outcome.report.total, 5.0);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod reward;
pub mod seed;
pub mod service;
pub mod store;
pub mod types;

pub use error::{KaulError, Result};
pub use reward::{
    DistributionReport, Payout, PositionBasis, RewardConfig, RewardEngine, RewardPolicy,
    VoteEvent,
};
pub use service::{Listing, VoteOutcome, VoteRules, VoteService};
pub use store::{DocumentStore, JsonFileStore, MemoryStore};
pub use types::{
    RewardEntry, Subject, SubjectId, SubjectsDocument, UserAccount, UserId, UserProfile,
    UsersDocument, VoteRecord, VoteTally, VoteType,
};

/// Points paid per vote.
pub const VOTE_COST: f64 = 10.0;

/// Starting balance of a new account.
pub const INITIAL_POINTS: f64 = 100.0;
