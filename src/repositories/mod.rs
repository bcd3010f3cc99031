pub(crate) mod assignments;
pub(crate) mod attempts;
pub(crate) mod courses;
pub(crate) mod modules;
pub(crate) mod users;
