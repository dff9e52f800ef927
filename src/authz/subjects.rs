use serde_json::Value;

use super::ability::{Field, FieldValue, Subject, SubjectType};
use crate::db::models::{Enrollment, Exam, Question, Section, User};

impl Subject for User {
    fn subject_type(&self) -> Option<SubjectType> {
        Some(SubjectType::User)
    }

    fn field(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Id => Some(self.id.into()),
            _ => None,
        }
    }
}

impl Subject for Exam {
    fn subject_type(&self) -> Option<SubjectType> {
        Some(SubjectType::Exam)
    }

    fn field(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Id => Some(self.id.into()),
            Field::OwnerId => Some(self.owner_id.into()),
            Field::IsPublished => Some(self.is_published.into()),
            Field::UserId => None,
        }
    }
}

impl Subject for Enrollment {
    fn subject_type(&self) -> Option<SubjectType> {
        Some(SubjectType::TestEnrollment)
    }

    fn field(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Id => Some(self.id.into()),
            Field::UserId => Some(self.user_id.into()),
            _ => None,
        }
    }
}

impl Subject for Section {
    fn subject_type(&self) -> Option<SubjectType> {
        Some(SubjectType::Section)
    }

    fn field(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Id => Some(self.id.into()),
            _ => None,
        }
    }
}

impl Subject for Question {
    fn subject_type(&self) -> Option<SubjectType> {
        Some(SubjectType::Question)
    }

    fn field(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Id => Some(self.id.into()),
            _ => None,
        }
    }
}

/// Dynamic records declare their type through a `kind` discriminant.
impl Subject for Value {
    fn subject_type(&self) -> Option<SubjectType> {
        self.get("kind").and_then(Value::as_str).and_then(SubjectType::parse)
    }

    fn field(&self, field: Field) -> Option<FieldValue> {
        let (camel, snake) = match field {
            Field::Id => ("id", "id"),
            Field::OwnerId => ("ownerId", "owner_id"),
            Field::UserId => ("userId", "user_id"),
            Field::IsPublished => ("isPublished", "is_published"),
        };
        let value = self.get(camel).or_else(|| self.get(snake))?;

        match value {
            Value::Bool(flag) => Some(FieldValue::Bool(*flag)),
            Value::Number(number) => number.as_i64().map(FieldValue::Int),
            _ => None,
        }
    }
}
