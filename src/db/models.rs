use sqlx::types::Json;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::types::{SessionKind, SessionStatus};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct SupportSession {
    pub(crate) id: String,
    pub(crate) token_hash: String,
    pub(crate) kind: SessionKind,
    pub(crate) operator_id: String,
    pub(crate) target_tenant_id: String,
    pub(crate) target_user_id: Option<String>,
    pub(crate) reason: String,
    pub(crate) payload: Option<Json<serde_json::Value>>,
    pub(crate) started_at: OffsetDateTime,
    pub(crate) expires_at: OffsetDateTime,
    pub(crate) ended_at: Option<OffsetDateTime>,
    pub(crate) was_used: bool,
    pub(crate) last_verified_at: Option<OffsetDateTime>,
    pub(crate) verify_count: i32,
}

impl SupportSession {
    /// An explicit end wins over expiry, even when both apply.
    pub(crate) fn status_at(&self, now: OffsetDateTime) -> SessionStatus {
        if self.ended_at.is_some() {
            SessionStatus::Ended
        } else if now >= self.expires_at {
            SessionStatus::Expired
        } else {
            SessionStatus::Active
        }
    }

    /// Moment after which the row no longer gates anything.
    pub(crate) fn closed_at(&self) -> OffsetDateTime {
        match self.ended_at {
            Some(ended_at) if ended_at < self.expires_at => ended_at,
            _ => self.expires_at,
        }
    }
}
