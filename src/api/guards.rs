use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{state::AppState, time::now_utc};
use crate::db::types::SessionKind;
use crate::services::support_sessions::{GrantContext, SupportSessionError};

/// A platform operator authenticated by a live operator-login session.
pub(crate) struct CurrentOperator {
    pub(crate) grant: GrantContext,
    pub(crate) token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentOperator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?
            .to_string();

        let grant = state
            .support_sessions()
            .verify_session_of_kind(&token, SessionKind::OperatorLogin, now_utc())
            .await
            .map_err(|err| match err {
                SupportSessionError::Invalid(_) => {
                    ApiError::Unauthorized("Invalid authentication credentials")
                }
                other => ApiError::from(other),
            })?;

        Ok(CurrentOperator { grant, token })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
