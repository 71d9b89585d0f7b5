pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod router;
pub(crate) mod scoring;
pub(crate) mod super_admin;
pub(crate) mod support_sessions;
pub(crate) mod validation;
