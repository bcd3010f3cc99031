pub(crate) mod assignments;
pub(crate) mod auth;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod modules;
pub(crate) mod router;
pub(crate) mod tests;
pub(crate) mod users;
pub(crate) mod validation;
