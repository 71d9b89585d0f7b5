use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment,
    parse_positive_u64, parse_store_backend, parse_u16, parse_u32,
};
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, RuntimeSettings,
    ServerHost, ServerPort, ServerSettings, SessionStoreBackend, Settings, SupportSettings,
    TelemetrySettings, TrustSettings,
};

/// Longest lifetime either session class may be configured with (7 days).
const MAX_SESSION_TTL_MINUTES: u64 = 7 * 24 * 60;

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("DOJO_HOST", "0.0.0.0");
        let port = env_or_default("DOJO_PORT", "8000");

        let environment =
            parse_environment(env_optional("DOJO_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("DOJO_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Dojo Arena API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "dojo");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "dojo_arena");
        let database_url = env_optional("DATABASE_URL");

        let impersonation_ttl_minutes = parse_positive_u64(
            "IMPERSONATION_TTL_MINUTES",
            env_or_default("IMPERSONATION_TTL_MINUTES", "30"),
        )?;
        let operator_session_ttl_minutes = parse_positive_u64(
            "OPERATOR_SESSION_TTL_MINUTES",
            env_or_default("OPERATOR_SESSION_TTL_MINUTES", "480"),
        )?;
        let stale_session_retention_hours = parse_positive_u64(
            "STALE_SESSION_RETENTION_HOURS",
            env_or_default("STALE_SESSION_RETENTION_HOURS", "168"),
        )?;
        let purge_interval_seconds = parse_positive_u64(
            "SESSION_PURGE_INTERVAL_SECONDS",
            env_or_default("SESSION_PURGE_INTERVAL_SECONDS", "3600"),
        )?;

        let store = parse_store_backend(env_optional("SUPPORT_SESSION_STORE"))?;

        let promote_after_approvals = parse_u32(
            "TRUST_PROMOTE_AFTER_APPROVALS",
            env_or_default("TRUST_PROMOTE_AFTER_APPROVALS", "5"),
        )?;
        let demote_after_rejections = parse_u32(
            "TRUST_DEMOTE_AFTER_REJECTIONS",
            env_or_default("TRUST_DEMOTE_AFTER_REJECTIONS", "2"),
        )?;

        let super_admin_email = env_or_default("SUPER_ADMIN_EMAIL", "");
        let super_admin_password_hash = env_or_default("SUPER_ADMIN_PASSWORD_HASH", "");

        let log_level = env_or_default("DOJO_LOG_LEVEL", "info");
        let json = env_optional("DOJO_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            support: SupportSettings {
                impersonation_ttl_minutes,
                operator_session_ttl_minutes,
                stale_session_retention_hours,
                purge_interval_seconds,
                store,
            },
            trust: TrustSettings { promote_after_approvals, demote_after_rejections },
            admin: AdminSettings { super_admin_email, super_admin_password_hash },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn support(&self) -> &SupportSettings {
        &self.support
    }

    pub(crate) fn trust(&self) -> &TrustSettings {
        &self.trust
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.trust.promote_after_approvals == 0 {
            return Err(ConfigError::InvalidValue {
                field: "TRUST_PROMOTE_AFTER_APPROVALS",
                value: "0".to_string(),
            });
        }
        if self.trust.demote_after_rejections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "TRUST_DEMOTE_AFTER_REJECTIONS",
                value: "0".to_string(),
            });
        }
        for (field, minutes) in [
            ("IMPERSONATION_TTL_MINUTES", self.support.impersonation_ttl_minutes),
            ("OPERATOR_SESSION_TTL_MINUTES", self.support.operator_session_ttl_minutes),
        ] {
            if minutes > MAX_SESSION_TTL_MINUTES {
                return Err(ConfigError::InvalidValue { field, value: minutes.to_string() });
            }
        }
        if self.support.impersonation_ttl_minutes > self.support.operator_session_ttl_minutes {
            return Err(ConfigError::InvalidValue {
                field: "IMPERSONATION_TTL_MINUTES",
                value: self.support.impersonation_ttl_minutes.to_string(),
            });
        }

        if self.runtime.environment.is_production()
            && self.support.store == SessionStoreBackend::Memory
        {
            return Err(ConfigError::InvalidValue {
                field: "SUPPORT_SESSION_STORE",
                value: self.support.store.as_str().to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.admin.super_admin_email.is_empty() {
            return Err(ConfigError::MissingSecret("SUPER_ADMIN_EMAIL"));
        }
        if self.admin.super_admin_password_hash.is_empty() {
            return Err(ConfigError::MissingSecret("SUPER_ADMIN_PASSWORD_HASH"));
        }

        Ok(())
    }
}

impl SupportSettings {
    pub(crate) fn impersonation_ttl(&self) -> time::Duration {
        duration_of(self.impersonation_ttl_minutes, 60)
    }

    pub(crate) fn operator_session_ttl(&self) -> time::Duration {
        duration_of(self.operator_session_ttl_minutes, 60)
    }

    pub(crate) fn stale_retention(&self) -> time::Duration {
        duration_of(self.stale_session_retention_hours, 3600)
    }
}

/// Saturates at `Duration::MAX` instead of wrapping; callers use checked
/// arithmetic on the result.
fn duration_of(count: u64, unit_seconds: i64) -> time::Duration {
    i64::try_from(count)
        .ok()
        .and_then(|count| count.checked_mul(unit_seconds))
        .map_or(time::Duration::MAX, time::Duration::seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn defaults_load_in_development() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        assert_eq!(settings.support().impersonation_ttl(), time::Duration::minutes(30));
        assert_eq!(settings.support().operator_session_ttl(), time::Duration::hours(8));
        assert_eq!(settings.trust().promote_after_approvals, 5);
        assert_eq!(settings.trust().demote_after_rejections, 2);
        assert_eq!(settings.api().api_v1_str, "/api/v1");
    }

    #[tokio::test]
    async fn zero_ttl_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("IMPERSONATION_TTL_MINUTES", "0");

        let err = Settings::load().unwrap_err();
        std::env::remove_var("IMPERSONATION_TTL_MINUTES");

        assert!(matches!(err, ConfigError::InvalidValue { field: "IMPERSONATION_TTL_MINUTES", .. }));
    }

    #[tokio::test]
    async fn oversized_ttl_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("OPERATOR_SESSION_TTL_MINUTES", "10000000000");

        let err = Settings::load().unwrap_err();
        std::env::set_var("OPERATOR_SESSION_TTL_MINUTES", "10081");
        let week_and_a_minute = Settings::load().unwrap_err();
        std::env::set_var("OPERATOR_SESSION_TTL_MINUTES", "10080");
        let one_week = Settings::load();
        std::env::remove_var("OPERATOR_SESSION_TTL_MINUTES");

        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "OPERATOR_SESSION_TTL_MINUTES", .. }
        ));
        assert!(matches!(
            week_and_a_minute,
            ConfigError::InvalidValue { field: "OPERATOR_SESSION_TTL_MINUTES", .. }
        ));
        assert_eq!(
            one_week.expect("settings").support().operator_session_ttl(),
            time::Duration::days(7)
        );
    }

    #[test]
    fn durations_saturate_instead_of_wrapping() {
        assert_eq!(duration_of(30, 60), time::Duration::minutes(30));
        assert_eq!(duration_of(u64::MAX, 60), time::Duration::MAX);
        assert_eq!(duration_of(u64::MAX / 2, 3600), time::Duration::MAX);
    }

    #[tokio::test]
    async fn strict_mode_requires_super_admin_credentials() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("DOJO_STRICT_CONFIG", "1");
        std::env::remove_var("SUPER_ADMIN_EMAIL");

        let err = Settings::load().unwrap_err();
        std::env::set_var("DOJO_STRICT_CONFIG", "0");

        assert!(matches!(err, ConfigError::MissingSecret("SUPER_ADMIN_EMAIL")));
    }

    #[tokio::test]
    async fn memory_store_is_refused_in_production() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("DOJO_ENV", "production");
        std::env::set_var("SUPPORT_SESSION_STORE", "memory");

        let err = Settings::load().unwrap_err();
        std::env::remove_var("SUPPORT_SESSION_STORE");
        std::env::set_var("DOJO_ENV", "test");

        assert!(matches!(err, ConfigError::InvalidValue { field: "SUPPORT_SESSION_STORE", .. }));
    }
}
