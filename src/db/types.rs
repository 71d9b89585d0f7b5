use serde::{Deserialize, Serialize};
use sqlx::Type;

/// The two token classes sharing the support-session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "supportsessionkind", rename_all = "snake_case")]
pub(crate) enum SessionKind {
    Impersonation,
    OperatorLogin,
}

impl SessionKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            SessionKind::Impersonation => "impersonation",
            SessionKind::OperatorLogin => "operator_login",
        }
    }
}

/// Derived at read time; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum SessionStatus {
    Active,
    Ended,
    Expired,
}
