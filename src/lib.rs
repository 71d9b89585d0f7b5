pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::core::config::{SessionStoreBackend, Settings};
use crate::core::{state::AppState, telemetry};
use crate::services::support_sessions::{
    MemorySupportSessionStore, PgSupportSessionStore, SupportSessionStore,
};

async fn build_state() -> anyhow::Result<AppState> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let store: Arc<dyn SupportSessionStore> = match settings.support().store {
        SessionStoreBackend::Postgres => {
            let db_pool = db::init_pool(&settings).await?;
            db::run_migrations(&db_pool).await?;
            Arc::new(PgSupportSessionStore::new(db_pool))
        }
        SessionStoreBackend::Memory => {
            tracing::warn!("support sessions are kept in memory and will not survive a restart");
            Arc::new(MemorySupportSessionStore::new())
        }
    };

    Ok(AppState::new(settings, store))
}

pub async fn run() -> anyhow::Result<()> {
    let state = build_state().await?;

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        session_store = state.settings().support().store.as_str(),
        "Dojo Arena API listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    Ok(())
}

/// Produces a `SUPER_ADMIN_PASSWORD_HASH` value for the operator login.
pub fn hash_operator_password(password: &str) -> anyhow::Result<String> {
    let password = password.trim_end_matches(['\r', '\n']);
    anyhow::ensure!(!password.is_empty(), "password must not be empty");
    Ok(core::security::hash_password(password)?)
}

pub async fn run_worker() -> anyhow::Result<()> {
    let state = build_state().await?;

    tracing::info!(
        purge_interval_seconds = state.settings().support().purge_interval_seconds,
        retention_hours = state.settings().support().stale_session_retention_hours,
        "Dojo Arena worker started"
    );

    tasks::scheduler::run(state).await
}
