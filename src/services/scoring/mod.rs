//! Pure conversion of grading and challenge inputs into the three reward
//! currencies: class points (PTS), experience (XP) and global rank score.
//!
//! Nothing here touches storage. Invalid input is returned as a
//! [`ScoringError`] and never clamped, since the results feed cross-club
//! leaderboards.

mod challenges;
mod grading;
mod trust;

use thiserror::Error;

pub(crate) use challenges::{
    evaluate_challenge, ChallengeReward, ChallengeSubmission, ChallengeType, DifficultyTier,
};
pub(crate) use grading::{
    calculate_streak_bonus, compute_class_pts, compute_class_xp, evaluate_grading, GradingInput,
    GradingOutcome, Mark,
};
pub(crate) use trust::{StudentProgress, TrustPolicy, TrustTier, TrustTransition};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ScoringError {
    #[error("tier {tier} is only available for weekly challenges")]
    InvalidTier { tier: DifficultyTier },
    #[error("{field} must not be negative, got {value}")]
    NegativeCount { field: &'static str, value: i64 },
    #[error("unknown mark value {0}; expected 2, 1, 0 or null")]
    UnknownMark(i64),
}

impl ScoringError {
    /// Stable label for metrics.
    pub(crate) fn reason(&self) -> &'static str {
        match self {
            ScoringError::InvalidTier { .. } => "invalid_tier",
            ScoringError::NegativeCount { .. } => "negative_count",
            ScoringError::UnknownMark(_) => "unknown_mark",
        }
    }
}

pub(super) fn non_negative(field: &'static str, value: i64) -> Result<u64, ScoringError> {
    u64::try_from(value).map_err(|_| ScoringError::NegativeCount { field, value })
}
