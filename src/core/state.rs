use std::sync::Arc;

use crate::core::config::Settings;
use crate::services::scoring::TrustPolicy;
use crate::services::support_sessions::{SessionTtls, SupportSessionService, SupportSessionStore};

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    support_sessions: SupportSessionService,
    trust_policy: TrustPolicy,
}

impl AppState {
    pub(crate) fn new(settings: Settings, store: Arc<dyn SupportSessionStore>) -> Self {
        let support_sessions =
            SupportSessionService::new(store, SessionTtls::from_settings(settings.support()));
        let trust_policy = TrustPolicy::from_settings(settings.trust());
        Self { inner: Arc::new(InnerState { settings, support_sessions, trust_policy }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn support_sessions(&self) -> &SupportSessionService {
        &self.inner.support_sessions
    }

    pub(crate) fn trust_policy(&self) -> &TrustPolicy {
        &self.inner.trust_policy
    }
}
