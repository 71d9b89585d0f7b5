use sqlx::types::Json;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::db::models::SupportSession;
use crate::db::types::SessionKind;

pub(crate) const COLUMNS: &str = "\
    id, token_hash, kind, operator_id, target_tenant_id, target_user_id, reason, payload, \
    started_at, expires_at, ended_at, was_used, last_verified_at, verify_count";

pub(crate) struct CreateSupportSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) token_hash: &'a str,
    pub(crate) kind: SessionKind,
    pub(crate) operator_id: &'a str,
    pub(crate) target_tenant_id: &'a str,
    pub(crate) target_user_id: Option<&'a str>,
    pub(crate) reason: &'a str,
    pub(crate) payload: Option<serde_json::Value>,
    pub(crate) started_at: OffsetDateTime,
    pub(crate) expires_at: OffsetDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    session: CreateSupportSession<'_>,
) -> Result<SupportSession, sqlx::Error> {
    sqlx::query_as::<_, SupportSession>(&format!(
        "INSERT INTO support_sessions (
            id, token_hash, kind, operator_id, target_tenant_id, target_user_id,
            reason, payload, started_at, expires_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}"
    ))
    .bind(session.id)
    .bind(session.token_hash)
    .bind(session.kind)
    .bind(session.operator_id)
    .bind(session.target_tenant_id)
    .bind(session.target_user_id)
    .bind(session.reason)
    .bind(session.payload.map(Json))
    .bind(session.started_at)
    .bind(session.expires_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_token_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<SupportSession>, sqlx::Error> {
    sqlx::query_as::<_, SupportSession>(&format!(
        "SELECT {COLUMNS} FROM support_sessions WHERE token_hash = $1"
    ))
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

/// Single conditional UPDATE so the liveness check and the audit write see one snapshot.
pub(crate) async fn mark_used(
    pool: &PgPool,
    token_hash: &str,
    now: OffsetDateTime,
) -> Result<Option<SupportSession>, sqlx::Error> {
    sqlx::query_as::<_, SupportSession>(&format!(
        "UPDATE support_sessions
         SET was_used = TRUE,
             last_verified_at = $2,
             verify_count = verify_count + 1
         WHERE token_hash = $1 AND ended_at IS NULL AND expires_at > $2
         RETURNING {COLUMNS}"
    ))
    .bind(token_hash)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Stamps `ended_at` once; later calls leave the first timestamp in place.
pub(crate) async fn end(
    pool: &PgPool,
    token_hash: &str,
    now: OffsetDateTime,
) -> Result<Option<SupportSession>, sqlx::Error> {
    sqlx::query_as::<_, SupportSession>(&format!(
        "UPDATE support_sessions
         SET ended_at = COALESCE(ended_at, $2)
         WHERE token_hash = $1
         RETURNING {COLUMNS}"
    ))
    .bind(token_hash)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_tenant(
    pool: &PgPool,
    target_tenant_id: &str,
    limit: i64,
) -> Result<Vec<SupportSession>, sqlx::Error> {
    sqlx::query_as::<_, SupportSession>(&format!(
        "SELECT {COLUMNS} FROM support_sessions
         WHERE target_tenant_id = $1
         ORDER BY started_at DESC
         LIMIT $2"
    ))
    .bind(target_tenant_id)
    .bind(limit.clamp(1, 500))
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete_closed_before(
    pool: &PgPool,
    cutoff: OffsetDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM support_sessions
         WHERE expires_at < $1 OR (ended_at IS NOT NULL AND ended_at < $1)",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
