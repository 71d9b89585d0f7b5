pub(crate) mod scoring;
pub(crate) mod support_sessions;
