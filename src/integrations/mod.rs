pub(crate) mod github;
pub(crate) mod webhook;
