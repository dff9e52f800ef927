pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod enrollments;
pub(crate) mod errors;
pub(crate) mod exams;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod pagination;
pub(crate) mod policy_guard;
pub(crate) mod router;
pub(crate) mod users;
pub(crate) mod validation;
