use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) is_admin: bool,
    pub(crate) is_educator: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: i64,
    pub(crate) owner_id: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: i32,
    pub(crate) is_published: bool,
    pub(crate) cover_image_key: Option<String>,
    pub(crate) published_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Section {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) section_id: i64,
    pub(crate) prompt: String,
    pub(crate) options: Json<Vec<String>>,
    pub(crate) correct_option: Option<i32>,
    pub(crate) points: f64,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: i64,
    pub(crate) exam_id: i64,
    pub(crate) user_id: i64,
    pub(crate) enrolled_at: PrimitiveDateTime,
}
