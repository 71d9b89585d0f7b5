use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::{format_offset, format_optional};
use crate::db::models::SupportSession;
use crate::db::types::{SessionKind, SessionStatus};
use crate::services::support_sessions::{GrantContext, IssuedSession};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OperatorLogin {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct OperatorTokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) expires_at: String,
}

impl OperatorTokenResponse {
    pub(crate) fn from_issued(issued: IssuedSession) -> Self {
        Self {
            access_token: issued.token,
            token_type: "bearer".to_string(),
            expires_at: format_offset(issued.expires_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ImpersonationCreate {
    #[validate(length(min = 1, max = 255, message = "target_tenant_id must be 1-255 characters"))]
    #[serde(alias = "targetTenantId")]
    pub(crate) target_tenant_id: String,
    #[serde(default)]
    #[serde(alias = "targetUserId")]
    #[validate(length(max = 255, message = "target_user_id must be at most 255 characters"))]
    pub(crate) target_user_id: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "reason must be 1-2000 characters"))]
    pub(crate) reason: String,
    #[serde(default)]
    pub(crate) payload: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImpersonationResponse {
    pub(crate) session_id: String,
    pub(crate) token: String,
    pub(crate) expires_at: String,
    pub(crate) expires_in_seconds: i64,
}

impl ImpersonationResponse {
    pub(crate) fn from_issued(issued: IssuedSession, now: OffsetDateTime) -> Self {
        Self {
            expires_in_seconds: (issued.expires_at - now).whole_seconds(),
            expires_at: format_offset(issued.expires_at),
            session_id: issued.session_id,
            token: issued.token,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SessionTokenPayload {
    #[validate(length(min = 1, message = "token must not be empty"))]
    pub(crate) token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GrantContextResponse {
    pub(crate) session_id: String,
    pub(crate) kind: SessionKind,
    pub(crate) operator_id: String,
    pub(crate) target_tenant_id: String,
    pub(crate) target_user_id: Option<String>,
    pub(crate) payload: Option<serde_json::Value>,
    pub(crate) expires_at: String,
    pub(crate) verify_count: i32,
}

impl GrantContextResponse {
    pub(crate) fn from_grant(grant: GrantContext) -> Self {
        Self {
            session_id: grant.session_id,
            kind: grant.kind,
            operator_id: grant.operator_id,
            target_tenant_id: grant.target_tenant_id,
            target_user_id: grant.target_user_id,
            payload: grant.payload,
            expires_at: format_offset(grant.expires_at),
            verify_count: grant.verify_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SupportSessionListQuery {
    #[serde(alias = "tenantId")]
    pub(crate) tenant_id: String,
    #[serde(default = "default_audit_limit")]
    pub(crate) limit: i64,
}

const fn default_audit_limit() -> i64 {
    50
}

/// Audit view of a session row; the token digest is never exposed.
#[derive(Debug, Serialize)]
pub(crate) struct SupportSessionAuditResponse {
    pub(crate) id: String,
    pub(crate) kind: SessionKind,
    pub(crate) status: SessionStatus,
    pub(crate) operator_id: String,
    pub(crate) target_tenant_id: String,
    pub(crate) target_user_id: Option<String>,
    pub(crate) reason: String,
    pub(crate) was_used: bool,
    pub(crate) verify_count: i32,
    pub(crate) started_at: String,
    pub(crate) expires_at: String,
    pub(crate) ended_at: Option<String>,
    pub(crate) last_verified_at: Option<String>,
}

impl SupportSessionAuditResponse {
    pub(crate) fn from_db(session: SupportSession, now: OffsetDateTime) -> Self {
        Self {
            status: session.status_at(now),
            id: session.id,
            kind: session.kind,
            operator_id: session.operator_id,
            target_tenant_id: session.target_tenant_id,
            target_user_id: session.target_user_id,
            reason: session.reason,
            was_used: session.was_used,
            verify_count: session.verify_count,
            started_at: format_offset(session.started_at),
            expires_at: format_offset(session.expires_at),
            ended_at: format_optional(session.ended_at),
            last_verified_at: format_optional(session.last_verified_at),
        }
    }
}
