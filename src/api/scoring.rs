use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::validation::ApiJson;
use crate::core::state::AppState;
use crate::schemas::scoring::{
    ChallengeRewardResponse, ClassScoreRequest, ClassScoreResponse, StreakBonusQuery,
    StreakBonusResponse, TrustReviewRequest, TrustReviewResponse,
};
use crate::services::scoring::{self, ChallengeSubmission, GradingInput, GradingOutcome};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/class", post(class_score))
        .route("/grading", post(grading))
        .route("/challenges", post(challenge_reward))
        .route("/streak-bonus", get(streak_bonus))
        .route("/trust-review", post(trust_review))
}

async fn class_score(ApiJson(payload): ApiJson<ClassScoreRequest>) -> Json<ClassScoreResponse> {
    Json(ClassScoreResponse {
        pts: scoring::compute_class_pts(&payload.marks),
        xp: scoring::compute_class_xp(&payload.marks),
        graded_items: payload.marks.iter().filter(|mark| mark.points().is_some()).count(),
    })
}

async fn grading(
    ApiJson(payload): ApiJson<GradingInput>,
) -> Result<Json<GradingOutcome>, ApiError> {
    let outcome = scoring::evaluate_grading(&payload)?;
    if outcome.legendary {
        tracing::debug!(grading_xp = outcome.grading_xp, "legendary grading session");
    }
    Ok(Json(outcome))
}

async fn challenge_reward(
    ApiJson(payload): ApiJson<ChallengeSubmission>,
) -> Result<Json<ChallengeRewardResponse>, ApiError> {
    let reward = scoring::evaluate_challenge(&payload)?;
    Ok(Json(ChallengeRewardResponse::new(&payload, reward)))
}

async fn streak_bonus(
    Query(params): Query<StreakBonusQuery>,
) -> Result<Json<StreakBonusResponse>, ApiError> {
    let bonus = scoring::calculate_streak_bonus(params.consecutive_classes)?;
    Ok(Json(StreakBonusResponse { consecutive_classes: params.consecutive_classes, bonus }))
}

async fn trust_review(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TrustReviewRequest>,
) -> Result<Json<TrustReviewResponse>, ApiError> {
    let mut progress = payload.progress;

    // Score first so an invalid challenge rejects the whole review.
    let reward = match (&payload.challenge, payload.approved) {
        (Some(challenge), true) => Some(scoring::evaluate_challenge(challenge)?),
        _ => None,
    };

    let transition = progress.record_video_review(payload.approved, state.trust_policy());
    if let Some(reward) = reward {
        progress.award_challenge(reward);
    }

    Ok(Json(TrustReviewResponse::new(progress, transition, reward)))
}
