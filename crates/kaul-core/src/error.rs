//! Error types for vote and reward operations.

use kaul_persist::PersistError;
use thiserror::Error;

use crate::types::{SubjectId, UserId, VoteType};

/// Result type alias for Kaul operations.
pub type Result<T> = std::result::Result<T, KaulError>;

/// Errors that can occur while recording votes or distributing rewards.
///
/// The display strings of the validation variants are shown to end users
/// verbatim.
#[derive(Debug, Error)]
pub enum KaulError {
    /// Voter balance is below the vote cost.
    #[error("Not enough points to vote")]
    InsufficientPoints {
        /// Current balance.
        have: f64,
        /// Required balance.
        need: f64,
    },

    /// No subject with this identifier.
    #[error("Subject not found")]
    SubjectNotFound {
        /// Requested subject.
        id: SubjectId,
    },

    /// The user already cast a vote of this type on the subject.
    #[error("You have already voted this way on this subject")]
    DuplicateVote {
        /// Voter.
        user: UserId,
        /// Subject voted on.
        subject: SubjectId,
        /// Type of the existing vote.
        vote_type: VoteType,
    },

    /// Vote type string was neither `up` nor `down`.
    #[error("Invalid vote type: {value}")]
    InvalidVoteType {
        /// Offending value.
        value: String,
    },

    /// A point amount was negative or not a finite number.
    #[error("invalid amount: {message}")]
    InvalidAmount {
        /// Description of the amount error.
        message: String,
    },

    /// Reward distribution could not be completed.
    #[error("reward distribution failed: {reason}")]
    Distribution {
        /// Reason for failure.
        reason: String,
    },

    /// Document store failure.
    #[error("store error: {0}")]
    Store(#[from] PersistError),
}

impl KaulError {
    /// Create an insufficient points error.
    #[must_use]
    pub fn insufficient_points(have: f64, need: f64) -> Self {
        Self::InsufficientPoints { have, need }
    }

    /// Create an invalid amount error.
    #[must_use]
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }

    /// Create a distribution error.
    #[must_use]
    pub fn distribution(reason: impl Into<String>) -> Self {
        Self::Distribution {
            reason: reason.into(),
        }
    }

    /// Whether this error was caused by the request rather than the system.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InsufficientPoints { .. }
                | Self::SubjectNotFound { .. }
                | Self::DuplicateVote { .. }
                | Self::InvalidVoteType { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            KaulError::insufficient_points(5.0, 10.0).to_string(),
            "Not enough points to vote"
        );
        assert_eq!(
            KaulError::SubjectNotFound { id: 9 }.to_string(),
            "Subject not found"
        );
        let dup = KaulError::DuplicateVote {
            user: UserId::from("user1"),
            subject: 1,
            vote_type: VoteType::Up,
        };
        assert_eq!(
            dup.to_string(),
            "You have already voted this way on this subject"
        );
    }

    #[test]
    fn test_validation_classification() {
        assert!(KaulError::insufficient_points(0.0, 10.0).is_validation());
        assert!(KaulError::SubjectNotFound { id: 1 }.is_validation());
        assert!(KaulError::InvalidVoteType {
            value: "sideways".to_string()
        }
        .is_validation());
        assert!(!KaulError::distribution("boom").is_validation());
        assert!(!KaulError::invalid_amount("nan").is_validation());
    }

    #[test]
    fn test_store_error_conversion() {
        let err: KaulError = PersistError::Io {
            path: "users.json".into(),
            source: std::io::Error::other("disk full"),
        }
        .into();

        assert!(matches!(err, KaulError::Store(_)));
        assert!(err.to_string().contains("disk full"));
        assert!(!err.is_validation());
    }
}
