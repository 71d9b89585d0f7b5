//! Support sessions: time-boxed bearer grants that let a platform operator
//! view a club's data as that club would see it.
//!
//! A session is live while `ended_at` is unset and `now < expires_at`.
//! Expiry is only checked when a token is presented; nothing sweeps rows in
//! the background except the optional maintenance purge. `was_used` is an
//! audit flag and never invalidates the token.

mod store;

use std::sync::Arc;

use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::core::config::SupportSettings;
use crate::core::security;
use crate::db::models::SupportSession;
use crate::db::types::SessionKind;

pub(crate) use store::{
    MemorySupportSessionStore, NewSupportSession, PgSupportSessionStore, StoreError,
    SupportSessionStore,
};

const MAX_REASON_LEN: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InvalidReason {
    NotFound,
    Ended,
    Expired,
    /// A token of the other class, e.g. an impersonation token sent as
    /// operator credentials.
    WrongKind,
}

impl InvalidReason {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            InvalidReason::NotFound => "not_found",
            InvalidReason::Ended => "ended",
            InvalidReason::Expired => "expired",
            InvalidReason::WrongKind => "wrong_kind",
        }
    }
}

/// Callers must fall back to regular authentication; the reason is for logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("support session is not valid")]
pub(crate) struct SessionInvalidError {
    pub(crate) reason: InvalidReason,
}

#[derive(Debug, Error)]
pub(crate) enum SupportSessionError {
    #[error(transparent)]
    Invalid(#[from] SessionInvalidError),
    #[error("{0}")]
    Validation(String),
    #[error("session lifetime does not fit the calendar")]
    ExpiryOutOfRange,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SessionTtls {
    pub(crate) impersonation: Duration,
    pub(crate) operator_login: Duration,
}

impl SessionTtls {
    pub(crate) fn from_settings(settings: &SupportSettings) -> Self {
        Self {
            impersonation: settings.impersonation_ttl(),
            operator_login: settings.operator_session_ttl(),
        }
    }

    pub(crate) fn for_kind(&self, kind: SessionKind) -> Duration {
        match kind {
            SessionKind::Impersonation => self.impersonation,
            SessionKind::OperatorLogin => self.operator_login,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CreateSessionRequest {
    pub(crate) operator_id: String,
    pub(crate) target_tenant_id: String,
    pub(crate) target_user_id: Option<String>,
    pub(crate) reason: String,
    /// Snapshot handed back on verification so the target surface can render
    /// without another round trip.
    pub(crate) payload: Option<serde_json::Value>,
}

/// Returned once at creation. The clear token is not recoverable afterwards.
#[derive(Debug, Clone)]
pub(crate) struct IssuedSession {
    pub(crate) session_id: String,
    pub(crate) token: String,
    pub(crate) kind: SessionKind,
    pub(crate) expires_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GrantContext {
    pub(crate) session_id: String,
    pub(crate) kind: SessionKind,
    pub(crate) operator_id: String,
    pub(crate) target_tenant_id: String,
    pub(crate) target_user_id: Option<String>,
    pub(crate) payload: Option<serde_json::Value>,
    pub(crate) expires_at: OffsetDateTime,
    pub(crate) verify_count: i32,
}

impl GrantContext {
    fn from_row(row: SupportSession) -> Self {
        Self {
            session_id: row.id,
            kind: row.kind,
            operator_id: row.operator_id,
            target_tenant_id: row.target_tenant_id,
            target_user_id: row.target_user_id,
            payload: row.payload.map(|payload| payload.0),
            expires_at: row.expires_at,
            verify_count: row.verify_count,
        }
    }
}

#[derive(Clone)]
pub(crate) struct SupportSessionService {
    store: Arc<dyn SupportSessionStore>,
    ttls: SessionTtls,
}

impl SupportSessionService {
    pub(crate) fn new(store: Arc<dyn SupportSessionStore>, ttls: SessionTtls) -> Self {
        Self { store, ttls }
    }

    pub(crate) fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub(crate) async fn health(&self) -> Result<(), StoreError> {
        self.store.health().await
    }

    pub(crate) async fn create_session(
        &self,
        kind: SessionKind,
        request: CreateSessionRequest,
        now: OffsetDateTime,
    ) -> Result<IssuedSession, SupportSessionError> {
        let request = normalize_request(request)?;

        let token = security::generate_session_token();
        let expires_at = now
            .checked_add(self.ttls.for_kind(kind))
            .ok_or(SupportSessionError::ExpiryOutOfRange)?;
        let row = self
            .store
            .insert(NewSupportSession {
                id: Uuid::new_v4().to_string(),
                token_hash: security::hash_session_token(&token),
                kind,
                operator_id: request.operator_id,
                target_tenant_id: request.target_tenant_id,
                target_user_id: request.target_user_id,
                reason: request.reason,
                payload: request.payload,
                started_at: now,
                expires_at,
            })
            .await?;

        tracing::info!(
            session_id = %row.id,
            kind = kind.as_str(),
            operator_id = %row.operator_id,
            target_tenant_id = %row.target_tenant_id,
            target_user_id = row.target_user_id.as_deref().unwrap_or("-"),
            reason = %row.reason,
            "support session created"
        );
        metrics::counter!("support_sessions_created_total", "kind" => kind.as_str()).increment(1);

        Ok(IssuedSession { session_id: row.id, token, kind, expires_at })
    }

    /// Validates a presented impersonation token and records the use. Repeated
    /// verification neither extends nor shortens the grant. Operator-login
    /// tokens are refused here so they never act as tenant grants.
    pub(crate) async fn verify_session(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<GrantContext, SupportSessionError> {
        self.verify_session_of_kind(token, SessionKind::Impersonation, now).await
    }

    /// Like [`Self::verify_session`] but for an explicit token class.
    /// A token of the other class is rejected without being marked used.
    pub(crate) async fn verify_session_of_kind(
        &self,
        token: &str,
        kind: SessionKind,
        now: OffsetDateTime,
    ) -> Result<GrantContext, SupportSessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(self.reject(InvalidReason::NotFound, None));
        }
        let token_hash = security::hash_session_token(token);

        match self.store.find_by_token_hash(&token_hash).await? {
            None => return Err(self.reject(InvalidReason::NotFound, None)),
            Some(row) if row.kind != kind => {
                return Err(self.reject(InvalidReason::WrongKind, Some(&row.id)));
            }
            Some(_) => {}
        }

        if let Some(row) = self.store.mark_used(&token_hash, now).await? {
            tracing::debug!(
                session_id = %row.id,
                verify_count = row.verify_count,
                "support session verified"
            );
            metrics::counter!("support_sessions_verified_total", "outcome" => "ok").increment(1);
            return Ok(GrantContext::from_row(row));
        }

        // The conditional update refused; read the row back only to say why.
        let reason = match self.store.find_by_token_hash(&token_hash).await? {
            None => (InvalidReason::NotFound, None),
            Some(row) if row.ended_at.is_some() => (InvalidReason::Ended, Some(row.id)),
            Some(row) => (InvalidReason::Expired, Some(row.id)),
        };
        Err(self.reject(reason.0, reason.1.as_deref()))
    }

    fn reject(&self, reason: InvalidReason, session_id: Option<&str>) -> SupportSessionError {
        tracing::info!(
            session_id = session_id.unwrap_or("-"),
            reason = reason.as_str(),
            "support session rejected"
        );
        metrics::counter!("support_sessions_verified_total", "outcome" => reason.as_str())
            .increment(1);
        SessionInvalidError { reason }.into()
    }

    /// Idempotent: ending an ended, expired or unknown token succeeds and the
    /// first `ended_at` is kept.
    pub(crate) async fn end_session(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<(), SupportSessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(());
        }

        match self.store.end(&security::hash_session_token(token), now).await? {
            Some(row) => {
                if row.ended_at == Some(now) {
                    tracing::info!(session_id = %row.id, kind = row.kind.as_str(), "support session ended");
                    metrics::counter!("support_sessions_ended_total").increment(1);
                }
            }
            None => tracing::debug!("end requested for unknown support session"),
        }

        Ok(())
    }

    pub(crate) async fn list_for_tenant(
        &self,
        target_tenant_id: &str,
        limit: i64,
    ) -> Result<Vec<SupportSession>, SupportSessionError> {
        Ok(self.store.list_for_tenant(target_tenant_id, limit).await?)
    }

    /// Deletes rows closed (ended or expired) more than `retention` before `now`.
    pub(crate) async fn purge_stale(
        &self,
        now: OffsetDateTime,
        retention: Duration,
    ) -> Result<u64, SupportSessionError> {
        let Some(cutoff) = now.checked_sub(retention) else {
            return Ok(0);
        };
        let purged = self.store.purge_closed_before(cutoff).await?;
        if purged > 0 {
            tracing::info!(purged, "purged stale support sessions");
            metrics::counter!("support_sessions_purged_total").increment(purged);
        }
        Ok(purged)
    }
}

fn normalize_request(
    request: CreateSessionRequest,
) -> Result<CreateSessionRequest, SupportSessionError> {
    let operator_id = request.operator_id.trim().to_string();
    let target_tenant_id = request.target_tenant_id.trim().to_string();
    let reason = request.reason.trim().to_string();
    let target_user_id = request
        .target_user_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    if operator_id.is_empty() {
        return Err(SupportSessionError::Validation("operator_id is required".to_string()));
    }
    if target_tenant_id.is_empty() {
        return Err(SupportSessionError::Validation("target_tenant_id is required".to_string()));
    }
    if reason.is_empty() {
        return Err(SupportSessionError::Validation("reason is required".to_string()));
    }
    if reason.chars().count() > MAX_REASON_LEN {
        return Err(SupportSessionError::Validation(format!(
            "reason must be at most {MAX_REASON_LEN} characters"
        )));
    }

    Ok(CreateSessionRequest {
        operator_id,
        target_tenant_id,
        target_user_id,
        reason,
        payload: request.payload,
    })
}
