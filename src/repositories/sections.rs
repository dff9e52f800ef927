use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Section;

const COLUMNS: &str = "id, exam_id, title, description, order_index, created_at, updated_at";

pub(crate) async fn find_in_exam(
    pool: &PgPool,
    exam_id: i64,
    section_id: i64,
) -> Result<Option<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>(&format!(
        "SELECT {COLUMNS} FROM sections WHERE id = $1 AND exam_id = $2"
    ))
    .bind(section_id)
    .bind(exam_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_exam(pool: &PgPool, exam_id: i64) -> Result<Vec<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>(&format!(
        "SELECT {COLUMNS} FROM sections WHERE exam_id = $1 ORDER BY order_index, id"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateSection<'a> {
    pub(crate) exam_id: i64,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateSection<'_>) -> Result<Section, sqlx::Error> {
    sqlx::query_as::<_, Section>(&format!(
        "INSERT INTO sections (exam_id, title, description, order_index, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.exam_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.order_index)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

#[derive(Debug, Default)]
pub(crate) struct UpdateSection {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) order_index: Option<i32>,
}

pub(crate) async fn update(
    pool: &PgPool,
    section_id: i64,
    params: UpdateSection,
    updated_at: PrimitiveDateTime,
) -> Result<Section, sqlx::Error> {
    sqlx::query_as::<_, Section>(&format!(
        "UPDATE sections SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            order_index = COALESCE($3, order_index),
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.order_index)
    .bind(updated_at)
    .bind(section_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, section_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sections WHERE id = $1").bind(section_id).execute(pool).await?;
    Ok(())
}
