use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

fn describe() {
    metrics::describe_counter!(
        "support_sessions_created_total",
        "Support sessions minted, labelled by token kind"
    );
    metrics::describe_counter!(
        "support_sessions_verified_total",
        "Support session verifications, labelled by outcome"
    );
    metrics::describe_counter!("support_sessions_ended_total", "Explicit support session ends");
    metrics::describe_counter!(
        "support_sessions_purged_total",
        "Stale support session rows removed by maintenance"
    );
    metrics::describe_counter!(
        "scoring_rejections_total",
        "Scoring requests rejected by validation, labelled by reason"
    );
}
