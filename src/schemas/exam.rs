use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::pagination::default_limit;
use crate::core::time::format_primitive;
use crate::db::models::{Enrollment, Exam, Question, Section};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, max = 1440, message = "duration_minutes must be between 1 and 1440"))]
    pub(crate) duration_minutes: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, max = 1440, message = "duration_minutes must be between 1 and 1440"))]
    pub(crate) duration_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExamListQuery {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
    #[serde(default)]
    #[serde(alias = "ownerId")]
    pub(crate) owner_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: i64,
    pub(crate) owner_id: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) is_published: bool,
    pub(crate) cover_image_url: Option<String>,
    pub(crate) published_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam, cover_image_url: Option<String>) -> Self {
        Self {
            id: exam.id,
            owner_id: exam.owner_id,
            title: exam.title,
            description: exam.description,
            duration_minutes: exam.duration_minutes,
            is_published: exam.is_published,
            cover_image_url,
            published_at: exam.published_at.map(format_primitive),
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SectionCreate {
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SectionUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 300, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SectionResponse {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl SectionResponse {
    pub(crate) fn from_db(section: Section) -> Self {
        Self {
            id: section.id,
            exam_id: section.exam_id,
            title: section.title,
            description: section.description,
            order_index: section.order_index,
            created_at: format_primitive(section.created_at),
            updated_at: format_primitive(section.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub(crate) prompt: String,
    #[validate(length(min = 2, max = 20, message = "options must hold 2 to 20 entries"))]
    pub(crate) options: Vec<String>,
    #[serde(default)]
    #[serde(alias = "correctOption")]
    pub(crate) correct_option: Option<i32>,
    #[serde(default = "default_points")]
    #[validate(range(exclusive_min = 0.0, message = "points must be positive"))]
    pub(crate) points: f64,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub(crate) prompt: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 20, message = "options must hold 2 to 20 entries"))]
    pub(crate) options: Option<Vec<String>>,
    #[serde(default)]
    #[serde(alias = "correctOption")]
    pub(crate) correct_option: Option<i32>,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "points must be positive"))]
    pub(crate) points: Option<f64>,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) section_id: i64,
    pub(crate) prompt: String,
    pub(crate) options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) correct_option: Option<i32>,
    pub(crate) points: f64,
    pub(crate) order_index: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl QuestionResponse {
    /// `include_answer` is false for callers who can only read the exam.
    pub(crate) fn from_db(question: Question, include_answer: bool) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            section_id: question.section_id,
            prompt: question.prompt,
            options: question.options.0,
            correct_option: question.correct_option.filter(|_| include_answer),
            points: question.points,
            order_index: question.order_index,
            created_at: format_primitive(question.created_at),
            updated_at: format_primitive(question.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentListQuery {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
    #[serde(default)]
    #[serde(alias = "examId")]
    pub(crate) exam_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) user_id: i64,
    pub(crate) enrolled_at: String,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            exam_id: enrollment.exam_id,
            user_id: enrollment.user_id,
            enrolled_at: format_primitive(enrollment.enrolled_at),
        }
    }
}

fn default_points() -> f64 {
    1.0
}
