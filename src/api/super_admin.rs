use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentOperator;
use crate::api::validation::{validate_payload, ApiJson};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::now_utc;
use crate::db::types::SessionKind;
use crate::schemas::support::{
    ImpersonationCreate, ImpersonationResponse, OperatorLogin, OperatorTokenResponse,
    SupportSessionAuditResponse, SupportSessionListQuery,
};
use crate::services::support_sessions::CreateSessionRequest;

/// Operator sessions are scoped to the platform rather than a club.
const PLATFORM_TENANT: &str = "platform";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/impersonate", post(impersonate))
        .route("/support-sessions", get(list_support_sessions))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<OperatorLogin>,
) -> Result<Json<OperatorTokenResponse>, ApiError> {
    validate_payload(&payload)?;

    let admin = state.settings().admin();
    if admin.super_admin_email.is_empty() || admin.super_admin_password_hash.is_empty() {
        tracing::warn!("super admin login attempted without configured credentials");
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    let email = payload.email.trim().to_lowercase();
    let email_matches =
        security::constant_time_eq(&email, &admin.super_admin_email.to_lowercase());
    // Always run the hash check so a wrong email costs the same as a wrong password.
    let password_matches =
        security::verify_password(&payload.password, &admin.super_admin_password_hash)
            .map_err(|_| ApiError::Unauthorized("Incorrect email or password"))?;

    if !(email_matches && password_matches) {
        tracing::info!("super admin login rejected");
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    let issued = state
        .support_sessions()
        .create_session(
            SessionKind::OperatorLogin,
            CreateSessionRequest {
                operator_id: email,
                target_tenant_id: PLATFORM_TENANT.to_string(),
                target_user_id: None,
                reason: "operator login".to_string(),
                payload: None,
            },
            now_utc(),
        )
        .await?;

    Ok(Json(OperatorTokenResponse::from_issued(issued)))
}

async fn logout(
    State(state): State<AppState>,
    operator: CurrentOperator,
) -> Result<StatusCode, ApiError> {
    state.support_sessions().end_session(&operator.token, now_utc()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn impersonate(
    State(state): State<AppState>,
    operator: CurrentOperator,
    ApiJson(payload): ApiJson<ImpersonationCreate>,
) -> Result<(StatusCode, Json<ImpersonationResponse>), ApiError> {
    validate_payload(&payload)?;

    let now = now_utc();
    let issued = state
        .support_sessions()
        .create_session(
            SessionKind::Impersonation,
            CreateSessionRequest {
                operator_id: operator.grant.operator_id,
                target_tenant_id: payload.target_tenant_id,
                target_user_id: payload.target_user_id,
                reason: payload.reason,
                payload: payload.payload,
            },
            now,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ImpersonationResponse::from_issued(issued, now))))
}

async fn list_support_sessions(
    State(state): State<AppState>,
    _operator: CurrentOperator,
    Query(params): Query<SupportSessionListQuery>,
) -> Result<Json<Vec<SupportSessionAuditResponse>>, ApiError> {
    let tenant_id = params.tenant_id.trim();
    if tenant_id.is_empty() {
        return Err(ApiError::BadRequest("tenant_id is required".to_string()));
    }

    let now = now_utc();
    let sessions = state.support_sessions().list_for_tenant(tenant_id, params.limit).await?;

    Ok(Json(
        sessions
            .into_iter()
            .map(|session| SupportSessionAuditResponse::from_db(session, now))
            .collect(),
    ))
}
