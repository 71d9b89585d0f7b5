use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::scoring::ScoringError;
use crate::services::support_sessions::SupportSessionError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ScoringError> for ApiError {
    fn from(err: ScoringError) -> Self {
        metrics::counter!("scoring_rejections_total", "reason" => err.reason()).increment(1);
        ApiError::BadRequest(err.to_string())
    }
}

impl From<SupportSessionError> for ApiError {
    fn from(err: SupportSessionError) -> Self {
        match err {
            SupportSessionError::Invalid(_) => {
                ApiError::Unauthorized("Support session is invalid or has expired")
            }
            SupportSessionError::Validation(message) => ApiError::BadRequest(message),
            err @ SupportSessionError::ExpiryOutOfRange => {
                ApiError::internal(err, "Support session lifetime misconfigured")
            }
            SupportSessionError::Store(err) => {
                ApiError::internal(err, "Support session store failure")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Unauthorized(message) => message.to_string(),
            ApiError::BadRequest(message) => message,
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                message
            }
        };

        let mut response =
            (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::support_sessions::{InvalidReason, SessionInvalidError, StoreError};

    #[test]
    fn invalid_sessions_map_to_401_with_challenge() {
        for reason in [InvalidReason::NotFound, InvalidReason::Ended, InvalidReason::Expired] {
            let err: ApiError = SupportSessionError::from(SessionInvalidError { reason }).into();
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        }
    }

    #[test]
    fn store_failures_are_not_authorization_errors() {
        let err: ApiError =
            SupportSessionError::Store(StoreError::Database(sqlx::Error::PoolTimedOut)).into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn scoring_errors_are_bad_requests() {
        let err: ApiError = ScoringError::UnknownMark(7).into();
        assert!(matches!(err, ApiError::BadRequest(ref message) if message.contains("7")));
    }
}
