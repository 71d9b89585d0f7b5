use std::fmt;

use serde::{Deserialize, Serialize};

use super::ScoringError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ChallengeType {
    /// Technical, instructor-curated.
    CoachPick,
    /// Open fitness.
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum DifficultyTier {
    Easy,
    Medium,
    Hard,
    /// Weekly challenges only.
    Epic,
}

impl ChallengeType {
    #[cfg(test)]
    pub(crate) const ALL: [ChallengeType; 2] = [ChallengeType::CoachPick, ChallengeType::General];

    fn row(self) -> usize {
        match self {
            ChallengeType::CoachPick => 0,
            ChallengeType::General => 1,
        }
    }
}

impl DifficultyTier {
    #[cfg(test)]
    pub(crate) const ALL: [DifficultyTier; 4] =
        [DifficultyTier::Easy, DifficultyTier::Medium, DifficultyTier::Hard, DifficultyTier::Epic];

    fn column(self) -> usize {
        match self {
            DifficultyTier::Easy => 0,
            DifficultyTier::Medium => 1,
            DifficultyTier::Hard => 2,
            DifficultyTier::Epic => 3,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            DifficultyTier::Easy => "EASY",
            DifficultyTier::Medium => "MEDIUM",
            DifficultyTier::Hard => "HARD",
            DifficultyTier::Epic => "EPIC",
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Award without and with video proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Award {
    without_video: u32,
    with_video: u32,
}

const fn award(without_video: u32, with_video: u32) -> Award {
    Award { without_video, with_video }
}

/// Rows are `ChallengeType`, columns are `DifficultyTier`.
struct RewardMatrix([[Award; 4]; 2]);

impl RewardMatrix {
    fn lookup(&self, challenge_type: ChallengeType, tier: DifficultyTier, has_video: bool) -> u32 {
        let cell = self.0[challenge_type.row()][tier.column()];
        if has_video {
            cell.with_video
        } else {
            cell.without_video
        }
    }
}

/// Local XP. Technical work is worth twice fitness work at every tier and
/// video proof doubles the award.
const CHALLENGE_XP_MATRIX: RewardMatrix = RewardMatrix([
    // EASY        MEDIUM        HARD          EPIC
    [award(10, 20), award(20, 40), award(35, 70), award(50, 100)], // coach_pick
    [award(5, 10), award(10, 20), award(15, 30), award(25, 50)],   // general
]);

/// Global rank score, roughly an order of magnitude below local XP.
const ARENA_GLOBAL_SCORE_MATRIX: RewardMatrix = RewardMatrix([
    // EASY      MEDIUM      HARD        EPIC
    [award(1, 5), award(3, 15), award(5, 25), award(10, 35)], // coach_pick
    [award(1, 3), award(2, 5), award(3, 10), award(5, 15)],   // general
]);

pub(crate) fn calculate_local_xp(
    challenge_type: ChallengeType,
    tier: DifficultyTier,
    has_video_proof: bool,
) -> u32 {
    CHALLENGE_XP_MATRIX.lookup(challenge_type, tier, has_video_proof)
}

pub(crate) fn calculate_arena_global_score(
    challenge_type: ChallengeType,
    tier: DifficultyTier,
    has_video_proof: bool,
) -> u32 {
    ARENA_GLOBAL_SCORE_MATRIX.lookup(challenge_type, tier, has_video_proof)
}

pub(crate) fn is_valid_tier_selection(tier: DifficultyTier, is_weekly_challenge: bool) -> bool {
    tier != DifficultyTier::Epic || is_weekly_challenge
}

pub(crate) fn validate_tier_selection(
    tier: DifficultyTier,
    is_weekly_challenge: bool,
) -> Result<(), ScoringError> {
    if is_valid_tier_selection(tier, is_weekly_challenge) {
        Ok(())
    } else {
        Err(ScoringError::InvalidTier { tier })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ChallengeSubmission {
    pub(crate) challenge_type: ChallengeType,
    pub(crate) tier: DifficultyTier,
    #[serde(default)]
    pub(crate) has_video_proof: bool,
    #[serde(default)]
    pub(crate) is_weekly_challenge: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ChallengeReward {
    pub(crate) local_xp: u32,
    pub(crate) global_rank_score: u32,
}

/// Rejects an EPIC pick outside a weekly challenge before touching the matrices.
pub(crate) fn evaluate_challenge(
    submission: &ChallengeSubmission,
) -> Result<ChallengeReward, ScoringError> {
    validate_tier_selection(submission.tier, submission.is_weekly_challenge)?;

    Ok(ChallengeReward {
        local_xp: calculate_local_xp(
            submission.challenge_type,
            submission.tier,
            submission.has_video_proof,
        ),
        global_rank_score: calculate_arena_global_score(
            submission.challenge_type,
            submission.tier,
            submission.has_video_proof,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChallengeType::{CoachPick, General};
    use DifficultyTier::{Easy, Epic, Hard, Medium};

    #[test]
    fn local_xp_matrix_values() {
        let expected = [
            (CoachPick, Easy, 10, 20),
            (CoachPick, Medium, 20, 40),
            (CoachPick, Hard, 35, 70),
            (CoachPick, Epic, 50, 100),
            (General, Easy, 5, 10),
            (General, Medium, 10, 20),
            (General, Hard, 15, 30),
            (General, Epic, 25, 50),
        ];
        for (kind, tier, free, premium) in expected {
            assert_eq!(calculate_local_xp(kind, tier, false), free, "{kind:?} {tier}");
            assert_eq!(calculate_local_xp(kind, tier, true), premium, "{kind:?} {tier}");
        }
    }

    #[test]
    fn global_score_matrix_values() {
        let expected = [
            (CoachPick, Easy, 1, 5),
            (CoachPick, Medium, 3, 15),
            (CoachPick, Hard, 5, 25),
            (CoachPick, Epic, 10, 35),
            (General, Easy, 1, 3),
            (General, Medium, 2, 5),
            (General, Hard, 3, 10),
            (General, Epic, 5, 15),
        ];
        for (kind, tier, no_video, video) in expected {
            assert_eq!(calculate_arena_global_score(kind, tier, false), no_video);
            assert_eq!(calculate_arena_global_score(kind, tier, true), video);
        }
    }

    #[test]
    fn video_proof_doubles_local_xp() {
        for kind in ChallengeType::ALL {
            for tier in DifficultyTier::ALL {
                assert_eq!(
                    calculate_local_xp(kind, tier, true),
                    2 * calculate_local_xp(kind, tier, false),
                    "{kind:?} {tier}"
                );
            }
        }
    }

    #[test]
    fn coach_pick_outranks_general_local_xp() {
        for tier in DifficultyTier::ALL {
            for proof in [false, true] {
                assert!(calculate_local_xp(CoachPick, tier, proof) > calculate_local_xp(General, tier, proof));
            }
        }
    }

    #[test]
    fn coach_pick_outranks_general_global_score_except_easy_without_video() {
        assert_eq!(calculate_arena_global_score(CoachPick, Easy, false), 1);
        assert_eq!(calculate_arena_global_score(General, Easy, false), 1);

        for tier in DifficultyTier::ALL {
            for proof in [false, true] {
                if tier == Easy && !proof {
                    continue;
                }
                assert!(
                    calculate_arena_global_score(CoachPick, tier, proof)
                        > calculate_arena_global_score(General, tier, proof),
                    "{tier} video={proof}"
                );
            }
        }
    }

    #[test]
    fn global_score_stays_below_local_xp() {
        for kind in ChallengeType::ALL {
            for tier in DifficultyTier::ALL {
                for proof in [false, true] {
                    assert!(
                        calculate_arena_global_score(kind, tier, proof)
                            < calculate_local_xp(kind, tier, proof)
                    );
                }
            }
        }
    }

    #[test]
    fn epic_requires_weekly_challenge() {
        assert!(!is_valid_tier_selection(Epic, false));
        assert!(is_valid_tier_selection(Epic, true));
        for tier in [Easy, Medium, Hard] {
            assert!(is_valid_tier_selection(tier, false));
            assert!(is_valid_tier_selection(tier, true));
        }
        assert_eq!(validate_tier_selection(Epic, false), Err(ScoringError::InvalidTier { tier: Epic }));
    }

    #[test]
    fn evaluate_challenge_rejects_instead_of_downgrading() {
        let submission = ChallengeSubmission {
            challenge_type: CoachPick,
            tier: Epic,
            has_video_proof: true,
            is_weekly_challenge: false,
        };
        assert_eq!(evaluate_challenge(&submission), Err(ScoringError::InvalidTier { tier: Epic }));

        let weekly = ChallengeSubmission { is_weekly_challenge: true, ..submission };
        assert_eq!(
            evaluate_challenge(&weekly),
            Ok(ChallengeReward { local_xp: 100, global_rank_score: 35 })
        );
    }

    #[test]
    fn enums_use_wire_names() {
        let submission: ChallengeSubmission = serde_json::from_value(serde_json::json!({
            "challenge_type": "general",
            "tier": "MEDIUM",
            "has_video_proof": false
        }))
        .expect("submission");
        assert_eq!(submission.challenge_type, General);
        assert_eq!(submission.tier, Medium);
        assert!(!submission.is_weekly_challenge);

        assert!(serde_json::from_value::<ChallengeSubmission>(serde_json::json!({
            "challenge_type": "cardio",
            "tier": "EASY"
        }))
        .is_err());
    }
}
