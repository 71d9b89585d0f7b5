use serde::{Deserialize, Serialize};

use super::{non_negative, ScoringError};

pub(crate) const PERFECT_CLASS_XP: u32 = 100;
pub(crate) const GRADING_XP_CAP: u32 = 110;
const COACH_BONUS_POINTS: u32 = 5;
const HOMEWORK_POINTS: u32 = 5;

/// A single skill grade. On the wire: `2`, `1`, `0`, or `null` for not graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Option<i64>", into = "Option<i64>")]
pub(crate) enum Mark {
    Green,
    Yellow,
    Red,
    Unset,
}

impl Mark {
    pub(crate) fn points(self) -> Option<u32> {
        match self {
            Mark::Green => Some(2),
            Mark::Yellow => Some(1),
            Mark::Red => Some(0),
            Mark::Unset => None,
        }
    }
}

impl TryFrom<Option<i64>> for Mark {
    type Error = ScoringError;

    fn try_from(value: Option<i64>) -> Result<Self, Self::Error> {
        match value {
            None => Ok(Mark::Unset),
            Some(2) => Ok(Mark::Green),
            Some(1) => Ok(Mark::Yellow),
            Some(0) => Ok(Mark::Red),
            Some(other) => Err(ScoringError::UnknownMark(other)),
        }
    }
}

impl From<Mark> for Option<i64> {
    fn from(mark: Mark) -> Self {
        mark.points().map(i64::from)
    }
}

/// Sum and count of the graded (non-`Unset`) marks.
fn graded(marks: &[Mark]) -> (u64, u64) {
    marks
        .iter()
        .filter_map(|mark| mark.points())
        .fold((0, 0), |(sum, count), points| (sum + u64::from(points), count + 1))
}

/// Raw class points. Uncapped: bounded only by the number of graded items.
pub(crate) fn compute_class_pts(marks: &[Mark]) -> u64 {
    graded(marks).0
}

/// Class XP normalised so that an all-green class is always exactly 100.
///
/// `round(sum / (graded * 2) * 100)` with halves rounded up, computed in
/// integers. No graded marks yields 0.
pub(crate) fn compute_class_xp(marks: &[Mark]) -> u32 {
    let (sum, count) = graded(marks);
    if count == 0 {
        return 0;
    }
    // floor((100 * sum + count) / (2 * count)) == round_half_up(50 * sum / count)
    let xp = (100 * sum + count) / (2 * count);
    xp.min(u64::from(PERFECT_CLASS_XP)) as u32
}

/// The "110 protocol": class XP plus a flat +5 for a coach bonus and a flat
/// +5 for homework, each only when the club has the feature enabled and the
/// submitted value is positive. Capped at 110.
pub(crate) fn compute_grading_xp(
    marks: &[Mark],
    coach_bonus: i64,
    homework: i64,
    coach_bonus_enabled: bool,
    homework_enabled: bool,
) -> Result<u32, ScoringError> {
    let coach_bonus = non_negative("coach_bonus", coach_bonus)?;
    let homework = non_negative("homework", homework)?;

    let (_, graded_count) = graded(marks);
    if graded_count == 0 {
        return Ok(0);
    }

    let skill_score = compute_class_xp(marks);
    let bonus_points = if coach_bonus_enabled && coach_bonus > 0 { COACH_BONUS_POINTS } else { 0 };
    let homework_points = if homework_enabled && homework > 0 { HOMEWORK_POINTS } else { 0 };

    Ok((skill_score + bonus_points + homework_points).min(GRADING_XP_CAP))
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GradingInput {
    pub(crate) marks: Vec<Mark>,
    #[serde(default)]
    pub(crate) coach_bonus: i64,
    #[serde(default)]
    pub(crate) homework: i64,
    #[serde(default)]
    pub(crate) coach_bonus_enabled: bool,
    #[serde(default)]
    pub(crate) homework_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct GradingOutcome {
    pub(crate) pts: u64,
    pub(crate) xp: u32,
    pub(crate) grading_xp: u32,
    /// Above a perfect class; only reachable through the bonus points.
    pub(crate) legendary: bool,
}

pub(crate) fn evaluate_grading(input: &GradingInput) -> Result<GradingOutcome, ScoringError> {
    let grading_xp = compute_grading_xp(
        &input.marks,
        input.coach_bonus,
        input.homework,
        input.coach_bonus_enabled,
        input.homework_enabled,
    )?;

    Ok(GradingOutcome {
        pts: compute_class_pts(&input.marks),
        xp: compute_class_xp(&input.marks),
        grading_xp,
        legendary: grading_xp > PERFECT_CLASS_XP,
    })
}

/// Attendance streak bonus. Bands are inclusive at their lower bound:
/// `<3 -> 0`, `3..=4 -> 5`, `5..=9 -> 10`, `>=10 -> 15`.
pub(crate) fn calculate_streak_bonus(consecutive_classes: i64) -> Result<u32, ScoringError> {
    let attended = non_negative("consecutive_classes", consecutive_classes)?;
    Ok(match attended {
        0..=2 => 0,
        3..=4 => 5,
        5..=9 => 10,
        _ => 15,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use Mark::{Green, Red, Unset, Yellow};

    #[test]
    fn perfect_class_is_100_for_any_length() {
        for len in 1..=40 {
            let marks = vec![Green; len];
            assert_eq!(compute_class_xp(&marks), 100, "len {len}");
        }
    }

    #[test]
    fn class_xp_stays_within_bounds() {
        let pool = [Green, Yellow, Red, Unset];
        // every sequence of length 4 over the four marks
        for a in pool {
            for b in pool {
                for c in pool {
                    for d in pool {
                        let xp = compute_class_xp(&[a, b, c, d]);
                        assert!(xp <= 100, "{a:?} {b:?} {c:?} {d:?} -> {xp}");
                    }
                }
            }
        }
    }

    #[test]
    fn empty_and_unset_inputs_yield_zero() {
        assert_eq!(compute_class_pts(&[]), 0);
        assert_eq!(compute_class_xp(&[]), 0);
        assert_eq!(compute_class_pts(&[Unset, Unset]), 0);
        assert_eq!(compute_class_xp(&[Unset, Unset]), 0);
        assert_eq!(compute_grading_xp(&[], 3, 1, true, true), Ok(0));
        assert_eq!(compute_grading_xp(&[Unset], 3, 1, true, true), Ok(0));
    }

    #[test]
    fn unset_marks_do_not_dilute_the_denominator() {
        assert_eq!(compute_class_xp(&[Green, Unset, Unset]), 100);
        assert_eq!(compute_class_xp(&[Green, Red, Unset]), 50);
    }

    #[test]
    fn mixed_class_example() {
        let marks = [Green, Green, Green, Yellow];
        assert_eq!(compute_class_pts(&marks), 7);
        assert_eq!(compute_class_xp(&marks), 88);
        assert_eq!(compute_grading_xp(&marks, 0, 0, false, false), Ok(88));
    }

    #[test]
    fn class_points_are_not_clamped() {
        let marks = vec![Green; 50_000];
        assert_eq!(compute_class_pts(&marks), 100_000);
        assert_eq!(compute_class_xp(&marks), 100);
    }

    #[test]
    fn halves_round_up() {
        // 1 / 8 * 100 = 12.5
        assert_eq!(compute_class_xp(&[Yellow, Red, Red, Red]), 13);
        // 2 / 6 * 100 = 33.33
        assert_eq!(compute_class_xp(&[Yellow, Yellow, Red]), 33);
    }

    #[test]
    fn coach_bonus_is_a_flat_five() {
        let marks = [Green; 4];
        assert_eq!(compute_grading_xp(&marks, 3, 0, true, false), Ok(105));
        assert_eq!(compute_grading_xp(&marks, 1, 0, true, false), Ok(105));
        assert_eq!(compute_grading_xp(&marks, 50, 0, true, false), Ok(105));
    }

    #[test]
    fn disabled_features_ignore_positive_values() {
        let marks = [Green; 4];
        assert_eq!(compute_grading_xp(&marks, 3, 2, false, false), Ok(100));
        assert_eq!(compute_grading_xp(&marks, 0, 0, true, true), Ok(100));
    }

    #[test]
    fn full_bonus_reaches_exactly_110() {
        let marks = [Green; 6];
        assert_eq!(compute_grading_xp(&marks, 1, 1, true, true), Ok(110));
        assert_eq!(compute_grading_xp(&[Green, Yellow], 1, 1, true, true), Ok(85));
    }

    #[test]
    fn negative_bonus_inputs_are_rejected() {
        assert_eq!(
            compute_grading_xp(&[Green], -1, 0, true, true),
            Err(ScoringError::NegativeCount { field: "coach_bonus", value: -1 })
        );
        assert_eq!(
            compute_grading_xp(&[Green], 0, -4, false, false),
            Err(ScoringError::NegativeCount { field: "homework", value: -4 })
        );
    }

    #[test]
    fn evaluate_grading_flags_legendary_sessions() {
        let input = GradingInput {
            marks: vec![Green; 4],
            coach_bonus: 2,
            homework: 0,
            coach_bonus_enabled: true,
            homework_enabled: true,
        };
        let outcome = evaluate_grading(&input).expect("outcome");
        assert_eq!(outcome, GradingOutcome { pts: 8, xp: 100, grading_xp: 105, legendary: true });

        let plain = GradingInput { coach_bonus: 0, ..input };
        assert!(!evaluate_grading(&plain).expect("outcome").legendary);
    }

    #[test]
    fn streak_bonus_band_boundaries() {
        let cases = [(0, 0), (2, 0), (3, 5), (4, 5), (5, 10), (9, 10), (10, 15), (250, 15)];
        for (classes, bonus) in cases {
            assert_eq!(calculate_streak_bonus(classes), Ok(bonus), "{classes} classes");
        }
        assert!(matches!(
            calculate_streak_bonus(-1),
            Err(ScoringError::NegativeCount { field: "consecutive_classes", .. })
        ));
    }

    #[test]
    fn marks_deserialize_from_numbers_and_null() {
        let marks: Vec<Mark> = serde_json::from_str("[2, 1, 0, null]").expect("marks");
        assert_eq!(marks, vec![Green, Yellow, Red, Unset]);

        let err = serde_json::from_str::<Vec<Mark>>("[3]").unwrap_err();
        assert!(err.to_string().contains("unknown mark value 3"));

        assert_eq!(serde_json::to_string(&marks).unwrap(), "[2,1,0,null]");
    }
}
