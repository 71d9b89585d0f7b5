pub(crate) mod support_sessions;
