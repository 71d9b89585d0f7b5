use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::db::models::SupportSession;
use crate::db::types::SessionKind;
use crate::repositories;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("session store database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("session token collision")]
    DuplicateToken,
}

#[derive(Debug, Clone)]
pub(crate) struct NewSupportSession {
    pub(crate) id: String,
    pub(crate) token_hash: String,
    pub(crate) kind: SessionKind,
    pub(crate) operator_id: String,
    pub(crate) target_tenant_id: String,
    pub(crate) target_user_id: Option<String>,
    pub(crate) reason: String,
    pub(crate) payload: Option<serde_json::Value>,
    pub(crate) started_at: OffsetDateTime,
    pub(crate) expires_at: OffsetDateTime,
}

/// Keyed persistence for support sessions. Each call is one atomic operation
/// against the backing store.
#[async_trait]
pub(crate) trait SupportSessionStore: Send + Sync {
    async fn insert(&self, session: NewSupportSession) -> Result<SupportSession, StoreError>;

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<SupportSession>, StoreError>;

    /// Records a verification, but only while the row is neither ended nor
    /// expired at `now`. `None` when the condition does not hold.
    async fn mark_used(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SupportSession>, StoreError>;

    /// Sets `ended_at` unless already set. `None` when the token is unknown.
    async fn end(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SupportSession>, StoreError>;

    async fn list_for_tenant(
        &self,
        target_tenant_id: &str,
        limit: i64,
    ) -> Result<Vec<SupportSession>, StoreError>;

    /// Deletes rows that stopped gating access before `cutoff`.
    async fn purge_closed_before(&self, cutoff: OffsetDateTime) -> Result<u64, StoreError>;

    async fn health(&self) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}

#[derive(Clone)]
pub(crate) struct PgSupportSessionStore {
    pool: PgPool,
}

impl PgSupportSessionStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SupportSessionStore for PgSupportSessionStore {
    async fn insert(&self, session: NewSupportSession) -> Result<SupportSession, StoreError> {
        repositories::support_sessions::create(
            &self.pool,
            repositories::support_sessions::CreateSupportSession {
                id: &session.id,
                token_hash: &session.token_hash,
                kind: session.kind,
                operator_id: &session.operator_id,
                target_tenant_id: &session.target_tenant_id,
                target_user_id: session.target_user_id.as_deref(),
                reason: &session.reason,
                payload: session.payload,
                started_at: session.started_at,
                expires_at: session.expires_at,
            },
        )
        .await
        .map_err(|err| {
            let duplicate =
                err.as_database_error().is_some_and(|db_err| db_err.is_unique_violation());
            if duplicate {
                StoreError::DuplicateToken
            } else {
                StoreError::Database(err)
            }
        })
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<SupportSession>, StoreError> {
        Ok(repositories::support_sessions::find_by_token_hash(&self.pool, token_hash).await?)
    }

    async fn mark_used(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SupportSession>, StoreError> {
        Ok(repositories::support_sessions::mark_used(&self.pool, token_hash, now).await?)
    }

    async fn end(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SupportSession>, StoreError> {
        Ok(repositories::support_sessions::end(&self.pool, token_hash, now).await?)
    }

    async fn list_for_tenant(
        &self,
        target_tenant_id: &str,
        limit: i64,
    ) -> Result<Vec<SupportSession>, StoreError> {
        Ok(repositories::support_sessions::list_for_tenant(&self.pool, target_tenant_id, limit)
            .await?)
    }

    async fn purge_closed_before(&self, cutoff: OffsetDateTime) -> Result<u64, StoreError> {
        Ok(repositories::support_sessions::delete_closed_before(&self.pool, cutoff).await?)
    }

    async fn health(&self) -> Result<(), StoreError> {
        Ok(repositories::support_sessions::ping(&self.pool).await?)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// Process-local store for tests and database-less development. Rows are
/// keyed by token hash, mirroring the unique index of the Postgres table.
#[derive(Default)]
pub(crate) struct MemorySupportSessionStore {
    sessions: RwLock<HashMap<String, SupportSession>>,
}

impl MemorySupportSessionStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SupportSessionStore for MemorySupportSessionStore {
    async fn insert(&self, session: NewSupportSession) -> Result<SupportSession, StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.token_hash) {
            return Err(StoreError::DuplicateToken);
        }

        let row = SupportSession {
            id: session.id,
            token_hash: session.token_hash.clone(),
            kind: session.kind,
            operator_id: session.operator_id,
            target_tenant_id: session.target_tenant_id,
            target_user_id: session.target_user_id,
            reason: session.reason,
            payload: session.payload.map(Json),
            started_at: session.started_at,
            expires_at: session.expires_at,
            ended_at: None,
            was_used: false,
            last_verified_at: None,
            verify_count: 0,
        };
        sessions.insert(session.token_hash, row.clone());
        Ok(row)
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<SupportSession>, StoreError> {
        Ok(self.sessions.read().await.get(token_hash).cloned())
    }

    async fn mark_used(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SupportSession>, StoreError> {
        let mut sessions = self.sessions.write().await;
        let Some(row) = sessions.get_mut(token_hash) else {
            return Ok(None);
        };
        if row.ended_at.is_some() || row.expires_at <= now {
            return Ok(None);
        }

        row.was_used = true;
        row.last_verified_at = Some(now);
        row.verify_count = row.verify_count.saturating_add(1);
        Ok(Some(row.clone()))
    }

    async fn end(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<SupportSession>, StoreError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(token_hash).map(|row| {
            row.ended_at.get_or_insert(now);
            row.clone()
        }))
    }

    async fn list_for_tenant(
        &self,
        target_tenant_id: &str,
        limit: i64,
    ) -> Result<Vec<SupportSession>, StoreError> {
        let mut rows: Vec<SupportSession> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|row| row.target_tenant_id == target_tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|left, right| right.started_at.cmp(&left.started_at));
        rows.truncate(limit.clamp(1, 500) as usize);
        Ok(rows)
    }

    async fn purge_closed_before(&self, cutoff: OffsetDateTime) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, row| row.closed_at() >= cutoff);
        Ok((before - sessions.len()) as u64)
    }

    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
