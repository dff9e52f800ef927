use super::ability::{Ability, AbilityBuilder, Action, Field, RuleSubject, SubjectType};
use super::Principal;

/// Builds the rule set for one principal. Admin takes precedence over educator.
pub(crate) fn build_ability(principal: &Principal) -> Ability {
    let mut builder = AbilityBuilder::new();

    if principal.is_admin {
        builder.can([Action::Manage], RuleSubject::All);
        return builder.build();
    }

    builder.can([Action::Read, Action::Update], SubjectType::User).when(Field::Id, principal.id);
    builder.can([Action::Read], SubjectType::Exam).when(Field::IsPublished, true);

    if principal.is_educator {
        // Declared after the published-read rule; owners see their drafts too.
        builder
            .can([Action::Update, Action::Read, Action::Delete], SubjectType::Exam)
            .when(Field::OwnerId, principal.id);
    }

    builder.build()
}
