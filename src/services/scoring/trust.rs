use serde::{Deserialize, Serialize};

use super::challenges::ChallengeReward;
use crate::core::config::TrustSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TrustTier {
    #[default]
    Unverified,
    Verified,
    Trusted,
}

impl TrustTier {
    fn promoted(self) -> Self {
        match self {
            TrustTier::Unverified => TrustTier::Verified,
            TrustTier::Verified | TrustTier::Trusted => TrustTier::Trusted,
        }
    }

    fn demoted(self) -> Self {
        match self {
            TrustTier::Trusted => TrustTier::Verified,
            TrustTier::Verified | TrustTier::Unverified => TrustTier::Unverified,
        }
    }

    /// Trusted students' challenge videos skip manual review.
    pub(crate) fn auto_approves(self) -> bool {
        matches!(self, TrustTier::Trusted)
    }
}

/// Thresholds are operational policy, loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrustPolicy {
    pub(crate) promote_after_approvals: u32,
    pub(crate) demote_after_rejections: u32,
}

impl TrustPolicy {
    pub(crate) fn from_settings(settings: &TrustSettings) -> Self {
        Self {
            promote_after_approvals: settings.promote_after_approvals,
            demote_after_rejections: settings.demote_after_rejections,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub(crate) enum TrustTransition {
    Unchanged,
    Promoted { from: TrustTier, to: TrustTier },
    Demoted { from: TrustTier, to: TrustTier },
}

/// The gamification fields of a student record this engine is allowed to move.
/// Belt-promotion resets of `lifetime_xp` and world ranks live elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StudentProgress {
    #[serde(default)]
    pub(crate) lifetime_xp: u64,
    #[serde(default)]
    pub(crate) global_xp: u64,
    #[serde(default)]
    pub(crate) trust_tier: TrustTier,
    #[serde(default)]
    pub(crate) video_approval_streak: u32,
    #[serde(default)]
    pub(crate) video_rejection_count: u32,
}

impl StudentProgress {
    pub(crate) fn award_challenge(&mut self, reward: ChallengeReward) {
        self.lifetime_xp = self.lifetime_xp.saturating_add(u64::from(reward.local_xp));
        self.global_xp = self.global_xp.saturating_add(u64::from(reward.global_rank_score));
    }

    /// Applies one reviewed challenge video.
    ///
    /// Approvals build a streak; reaching the policy threshold promotes one
    /// tier and restarts the streak. Rejections count only while consecutive:
    /// a rejection breaks the approval streak and an approval clears the
    /// rejection count. Reaching the rejection threshold drops one tier and
    /// restarts the count.
    pub(crate) fn record_video_review(
        &mut self,
        approved: bool,
        policy: &TrustPolicy,
    ) -> TrustTransition {
        let from = self.trust_tier;

        if approved {
            self.video_rejection_count = 0;
            self.video_approval_streak = self.video_approval_streak.saturating_add(1);
            if self.video_approval_streak >= policy.promote_after_approvals
                && from != TrustTier::Trusted
            {
                self.trust_tier = from.promoted();
                self.video_approval_streak = 0;
                return TrustTransition::Promoted { from, to: self.trust_tier };
            }
            return TrustTransition::Unchanged;
        }

        self.video_approval_streak = 0;
        self.video_rejection_count = self.video_rejection_count.saturating_add(1);
        if self.video_rejection_count >= policy.demote_after_rejections
            && from != TrustTier::Unverified
        {
            self.trust_tier = from.demoted();
            self.video_rejection_count = 0;
            return TrustTransition::Demoted { from, to: self.trust_tier };
        }

        TrustTransition::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: TrustPolicy = TrustPolicy { promote_after_approvals: 3, demote_after_rejections: 2 };

    #[test]
    fn consecutive_approvals_promote_one_tier_at_a_time() {
        let mut progress = StudentProgress::default();

        assert_eq!(progress.record_video_review(true, &POLICY), TrustTransition::Unchanged);
        assert_eq!(progress.record_video_review(true, &POLICY), TrustTransition::Unchanged);
        assert_eq!(
            progress.record_video_review(true, &POLICY),
            TrustTransition::Promoted { from: TrustTier::Unverified, to: TrustTier::Verified }
        );
        assert_eq!(progress.video_approval_streak, 0);

        for _ in 0..2 {
            progress.record_video_review(true, &POLICY);
        }
        assert_eq!(
            progress.record_video_review(true, &POLICY),
            TrustTransition::Promoted { from: TrustTier::Verified, to: TrustTier::Trusted }
        );
        assert!(progress.trust_tier.auto_approves());
    }

    #[test]
    fn trusted_is_the_ceiling() {
        let mut progress =
            StudentProgress { trust_tier: TrustTier::Trusted, ..StudentProgress::default() };
        for _ in 0..10 {
            assert_eq!(progress.record_video_review(true, &POLICY), TrustTransition::Unchanged);
        }
        assert_eq!(progress.trust_tier, TrustTier::Trusted);
    }

    #[test]
    fn rejection_breaks_the_approval_streak() {
        let mut progress = StudentProgress::default();
        progress.record_video_review(true, &POLICY);
        progress.record_video_review(true, &POLICY);
        progress.record_video_review(false, &POLICY);
        assert_eq!(progress.video_approval_streak, 0);
        assert_eq!(progress.record_video_review(true, &POLICY), TrustTransition::Unchanged);
        assert_eq!(progress.trust_tier, TrustTier::Unverified);
    }

    #[test]
    fn repeated_rejections_demote() {
        let mut progress =
            StudentProgress { trust_tier: TrustTier::Trusted, ..StudentProgress::default() };
        assert_eq!(progress.record_video_review(false, &POLICY), TrustTransition::Unchanged);
        assert_eq!(
            progress.record_video_review(false, &POLICY),
            TrustTransition::Demoted { from: TrustTier::Trusted, to: TrustTier::Verified }
        );
        assert_eq!(progress.video_rejection_count, 0);
        assert!(!progress.trust_tier.auto_approves());
    }

    #[test]
    fn unverified_is_the_floor() {
        let mut progress = StudentProgress::default();
        for _ in 0..5 {
            assert_eq!(progress.record_video_review(false, &POLICY), TrustTransition::Unchanged);
        }
        assert_eq!(progress.trust_tier, TrustTier::Unverified);
        assert_eq!(progress.video_rejection_count, 5);
    }

    #[test]
    fn rejections_before_a_promotion_do_not_count_after_it() {
        let mut progress = StudentProgress::default();
        for _ in 0..4 {
            progress.record_video_review(false, &POLICY);
        }
        for _ in 0..2 {
            progress.record_video_review(true, &POLICY);
        }
        assert_eq!(
            progress.record_video_review(true, &POLICY),
            TrustTransition::Promoted { from: TrustTier::Unverified, to: TrustTier::Verified }
        );
        assert_eq!(progress.video_rejection_count, 0);

        assert_eq!(progress.record_video_review(false, &POLICY), TrustTransition::Unchanged);
        assert_eq!(progress.trust_tier, TrustTier::Verified);
    }

    #[test]
    fn an_approval_clears_the_rejection_count() {
        let mut progress =
            StudentProgress { trust_tier: TrustTier::Verified, ..StudentProgress::default() };
        progress.record_video_review(false, &POLICY);
        progress.record_video_review(true, &POLICY);
        assert_eq!(progress.record_video_review(false, &POLICY), TrustTransition::Unchanged);
        assert_eq!(progress.trust_tier, TrustTier::Verified);
    }

    #[test]
    fn award_challenge_feeds_both_currencies() {
        let mut progress = StudentProgress { lifetime_xp: 40, global_xp: 7, ..Default::default() };
        progress.award_challenge(ChallengeReward { local_xp: 70, global_rank_score: 25 });
        assert_eq!(progress.lifetime_xp, 110);
        assert_eq!(progress.global_xp, 32);
    }

    #[test]
    fn policy_reads_configured_thresholds() {
        let settings = TrustSettings { promote_after_approvals: 7, demote_after_rejections: 4 };
        assert_eq!(
            TrustPolicy::from_settings(&settings),
            TrustPolicy { promote_after_approvals: 7, demote_after_rejections: 4 }
        );
    }
}
