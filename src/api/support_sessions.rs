use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::api::errors::ApiError;
use crate::api::validation::{validate_payload, ApiJson};
use crate::core::state::AppState;
use crate::core::time::now_utc;
use crate::schemas::support::{GrantContextResponse, SessionTokenPayload};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/verify", post(verify)).route("/end", post(end))
}

/// Called by tenant backends for every request made under an impersonation token.
async fn verify(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SessionTokenPayload>,
) -> Result<Json<GrantContextResponse>, ApiError> {
    validate_payload(&payload)?;

    let grant = state.support_sessions().verify_session(&payload.token, now_utc()).await?;
    Ok(Json(GrantContextResponse::from_grant(grant)))
}

async fn end(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SessionTokenPayload>,
) -> Result<StatusCode, ApiError> {
    validate_payload(&payload)?;

    state.support_sessions().end_session(&payload.token, now_utc()).await?;
    Ok(StatusCode::NO_CONTENT)
}
