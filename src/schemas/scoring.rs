use serde::{Deserialize, Serialize};

use crate::services::scoring::{
    ChallengeReward, ChallengeSubmission, ChallengeType, DifficultyTier, Mark, StudentProgress,
    TrustTier, TrustTransition,
};

#[derive(Debug, Deserialize)]
pub(crate) struct ClassScoreRequest {
    pub(crate) marks: Vec<Mark>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassScoreResponse {
    pub(crate) pts: u64,
    pub(crate) xp: u32,
    pub(crate) graded_items: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChallengeRewardResponse {
    pub(crate) challenge_type: ChallengeType,
    pub(crate) tier: DifficultyTier,
    pub(crate) has_video_proof: bool,
    pub(crate) local_xp: u32,
    pub(crate) global_rank_score: u32,
}

impl ChallengeRewardResponse {
    pub(crate) fn new(submission: &ChallengeSubmission, reward: ChallengeReward) -> Self {
        Self {
            challenge_type: submission.challenge_type,
            tier: submission.tier,
            has_video_proof: submission.has_video_proof,
            local_xp: reward.local_xp,
            global_rank_score: reward.global_rank_score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreakBonusQuery {
    pub(crate) consecutive_classes: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct StreakBonusResponse {
    pub(crate) consecutive_classes: i64,
    pub(crate) bonus: u32,
}

/// One reviewed challenge video. When approved and `challenge` is present, the
/// challenge reward is credited in the same step.
#[derive(Debug, Deserialize)]
pub(crate) struct TrustReviewRequest {
    #[serde(default)]
    pub(crate) progress: StudentProgress,
    pub(crate) approved: bool,
    #[serde(default)]
    pub(crate) challenge: Option<ChallengeSubmission>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TrustReviewResponse {
    pub(crate) progress: StudentProgress,
    pub(crate) transition: TrustTransition,
    pub(crate) awarded: Option<ChallengeReward>,
    pub(crate) auto_approves: bool,
}

impl TrustReviewResponse {
    pub(crate) fn new(
        progress: StudentProgress,
        transition: TrustTransition,
        awarded: Option<ChallengeReward>,
    ) -> Self {
        let tier: TrustTier = progress.trust_tier;
        Self { progress, transition, awarded, auto_approves: tier.auto_approves() }
    }
}
