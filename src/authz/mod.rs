//! Capability rules and route policies.
//!
//! An [`Ability`] is built per request from the caller's [`Principal`] and
//! thrown away with the request. Route groups attach [`Policies`] that the
//! policy guard evaluates before the handler runs; handlers can also query the
//! ability inline for instance-level checks.

mod ability;
mod factory;
mod policies;
mod subjects;

pub(crate) use ability::{Ability, Action, Subject, SubjectType};
pub(crate) use factory::build_ability;
pub(crate) use policies::{evaluate, AdminAreaPolicy, Policies};

#[cfg(test)]
pub(crate) use policies::PolicyHandler;

use crate::db::models::User;

/// Authenticated caller as seen by the rule builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Principal {
    pub(crate) id: i64,
    pub(crate) is_admin: bool,
    pub(crate) is_educator: bool,
}

impl Principal {
    pub(crate) fn from_user(user: &User) -> Self {
        Self { id: user.id, is_admin: user.is_admin, is_educator: user.is_educator }
    }
}
