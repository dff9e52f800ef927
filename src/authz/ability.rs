use serde::Serialize;

/// Operation tag checked against a rule. `Manage` in a rule covers every action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Action {
    Manage,
    Create,
    Read,
    Update,
    Delete,
}

/// Nominal type of a protected resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub(crate) enum SubjectType {
    Exam,
    User,
    TestEnrollment,
    Section,
    Question,
}

impl SubjectType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Exam => "Exam",
            Self::User => "User",
            Self::TestEnrollment => "TestEnrollment",
            Self::Section => "Section",
            Self::Question => "Question",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "Exam" => Some(Self::Exam),
            "User" => Some(Self::User),
            "TestEnrollment" => Some(Self::TestEnrollment),
            "Section" => Some(Self::Section),
            "Question" => Some(Self::Question),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuleSubject {
    All,
    Type(SubjectType),
}

impl From<SubjectType> for RuleSubject {
    fn from(value: SubjectType) -> Self {
        Self::Type(value)
    }
}

/// Instance attributes a rule condition can compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Id,
    OwnerId,
    /// Owner of an enrollment. Exposed for enrollment-scoped rules; the
    /// built-in role rules do not condition on it.
    UserId,
    IsPublished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldValue {
    Int(i64),
    Bool(bool),
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Resolves a value to its declared subject type and exposes the fields
/// conditions are evaluated against.
///
/// `subject_type` returning `None` means the value could not be classified;
/// every query against it is denied.
pub(crate) trait Subject {
    fn subject_type(&self) -> Option<SubjectType>;

    fn field(&self, _field: Field) -> Option<FieldValue> {
        None
    }
}

/// Type-level query: carries no fields, so conditioned rules never match it.
impl Subject for SubjectType {
    fn subject_type(&self) -> Option<SubjectType> {
        Some(*self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rule {
    actions: Vec<Action>,
    subject: RuleSubject,
    conditions: Vec<(Field, FieldValue)>,
}

impl Rule {
    pub(crate) fn new(actions: impl IntoIterator<Item = Action>, subject: RuleSubject) -> Self {
        let mut deduped = Vec::new();
        for action in actions {
            if !deduped.contains(&action) {
                deduped.push(action);
            }
        }

        Self { actions: deduped, subject, conditions: Vec::new() }
    }

    pub(crate) fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub(crate) fn subject(&self) -> RuleSubject {
        self.subject
    }

    pub(crate) fn conditions(&self) -> &[(Field, FieldValue)] {
        &self.conditions
    }

    fn push_condition(&mut self, field: Field, value: FieldValue) {
        self.conditions.push((field, value));
    }

    fn matches_action(&self, action: Action) -> bool {
        self.actions.iter().any(|current| *current == Action::Manage || *current == action)
    }

    fn matches_subject(&self, subject_type: SubjectType) -> bool {
        match self.subject {
            RuleSubject::All => true,
            RuleSubject::Type(current) => current == subject_type,
        }
    }

    fn matches_conditions<S: Subject + ?Sized>(&self, subject: &S) -> bool {
        self.conditions.iter().all(|(field, expected)| subject.field(*field) == Some(*expected))
    }

    fn matches<S: Subject + ?Sized>(
        &self,
        action: Action,
        subject_type: SubjectType,
        subject: &S,
    ) -> bool {
        self.matches_subject(subject_type)
            && self.matches_action(action)
            && self.matches_conditions(subject)
    }
}

/// Immutable rule set for one principal, built per request.
#[derive(Debug, Clone, Default)]
pub(crate) struct Ability {
    rules: Vec<Rule>,
}

impl Ability {
    pub(crate) fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub(crate) fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Scans rules from the most recently declared one and returns on the first match.
    pub(crate) fn can<S: Subject + ?Sized>(&self, action: Action, subject: &S) -> bool {
        let Some(subject_type) = subject.subject_type() else {
            return false;
        };

        self.rules.iter().rev().any(|rule| rule.matches(action, subject_type, subject))
    }

    pub(crate) fn cannot<S: Subject + ?Sized>(&self, action: Action, subject: &S) -> bool {
        !self.can(action, subject)
    }
}

#[derive(Debug, Default)]
pub(crate) struct AbilityBuilder {
    rules: Vec<Rule>,
}

impl AbilityBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn can(
        &mut self,
        actions: impl IntoIterator<Item = Action>,
        subject: impl Into<RuleSubject>,
    ) -> RuleBuilder<'_> {
        let index = self.rules.len();
        self.rules.push(Rule::new(actions, subject.into()));
        RuleBuilder { rule: &mut self.rules[index] }
    }

    pub(crate) fn build(self) -> Ability {
        Ability::new(self.rules)
    }
}

pub(crate) struct RuleBuilder<'a> {
    rule: &'a mut Rule,
}

impl RuleBuilder<'_> {
    pub(crate) fn when(self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.rule.push_condition(field, value.into());
        self
    }
}
