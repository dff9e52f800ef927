use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Question;

const COLUMNS: &str = "\
    id, exam_id, section_id, prompt, options, correct_option, points, order_index, \
    created_at, updated_at";

pub(crate) async fn find_in_exam(
    pool: &PgPool,
    exam_id: i64,
    question_id: i64,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE id = $1 AND exam_id = $2"
    ))
    .bind(question_id)
    .bind(exam_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_section(
    pool: &PgPool,
    section_id: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE section_id = $1 ORDER BY order_index, id"
    ))
    .bind(section_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) exam_id: i64,
    pub(crate) section_id: i64,
    pub(crate) prompt: &'a str,
    pub(crate) options: Vec<String>,
    pub(crate) correct_option: Option<i32>,
    pub(crate) points: f64,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            exam_id, section_id, prompt, options, correct_option, points, order_index,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.exam_id)
    .bind(params.section_id)
    .bind(params.prompt)
    .bind(Json(params.options))
    .bind(params.correct_option)
    .bind(params.points)
    .bind(params.order_index)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

#[derive(Debug, Default)]
pub(crate) struct UpdateQuestion {
    pub(crate) prompt: Option<String>,
    pub(crate) options: Option<Vec<String>>,
    pub(crate) correct_option: Option<i32>,
    pub(crate) points: Option<f64>,
    pub(crate) order_index: Option<i32>,
}

pub(crate) async fn update(
    pool: &PgPool,
    question_id: i64,
    params: UpdateQuestion,
    updated_at: PrimitiveDateTime,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            prompt = COALESCE($1, prompt),
            options = COALESCE($2, options),
            correct_option = COALESCE($3, correct_option),
            points = COALESCE($4, points),
            order_index = COALESCE($5, order_index),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.prompt)
    .bind(params.options.map(Json))
    .bind(params.correct_option)
    .bind(params.points)
    .bind(params.order_index)
    .bind(updated_at)
    .bind(question_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, question_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM questions WHERE id = $1").bind(question_id).execute(pool).await?;
    Ok(())
}
