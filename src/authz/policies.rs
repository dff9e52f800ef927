use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::ability::{Ability, Action, SubjectType};

/// A named authorization requirement evaluated against a built [`Ability`].
///
/// An `Err` is treated by [`evaluate`] exactly like `Ok(false)`. Failures
/// must be reported as `Err`: a panic is not caught and aborts the request
/// instead of producing a 403.
#[async_trait]
pub(crate) trait PolicyHandler: Send + Sync {
    async fn handle(&self, ability: &Ability) -> anyhow::Result<bool>;

    fn name(&self) -> &'static str {
        "inline"
    }
}

#[async_trait]
impl<F> PolicyHandler for F
where
    F: Fn(&Ability) -> bool + Send + Sync,
{
    async fn handle(&self, ability: &Ability) -> anyhow::Result<bool> {
        Ok(self(ability))
    }
}

/// Gate for the admin area.
///
/// Only the wildcard admin rule satisfies all three checks today; the checks
/// stay separate so narrower admin rules keep working.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AdminAreaPolicy;

#[async_trait]
impl PolicyHandler for AdminAreaPolicy {
    async fn handle(&self, ability: &Ability) -> anyhow::Result<bool> {
        Ok(ability.can(Action::Read, &SubjectType::Exam)
            && ability.can(Action::Manage, &SubjectType::User)
            && ability.can(Action::Manage, &SubjectType::TestEnrollment))
    }

    fn name(&self) -> &'static str {
        "admin_area"
    }
}

/// Handlers attached to one route group. All of them must allow.
#[derive(Clone, Default)]
pub(crate) struct Policies {
    handlers: Vec<Arc<dyn PolicyHandler>>,
}

impl Policies {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, handler: impl PolicyHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Policies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.handlers.iter().map(|handler| handler.name())).finish()
    }
}

pub(crate) async fn evaluate(ability: &Ability, policies: &Policies) -> bool {
    for handler in &policies.handlers {
        match handler.handle(ability).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                tracing::warn!(error = %err, policy = handler.name(), "Policy handler failed");
                return false;
            }
        }
    }

    true
}
