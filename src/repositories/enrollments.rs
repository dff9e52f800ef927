use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Enrollment;
use super::Page;

const COLUMNS: &str = "id, exam_id, user_id, enrolled_at";

/// Returns `None` when the user is already enrolled.
pub(crate) async fn create(
    pool: &PgPool,
    exam_id: i64,
    user_id: i64,
    enrolled_at: PrimitiveDateTime,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO test_enrollments (exam_id, user_id, enrolled_at)
         VALUES ($1,$2,$3)
         ON CONFLICT (exam_id, user_id) DO NOTHING
         RETURNING {COLUMNS}",
    ))
    .bind(exam_id)
    .bind(user_id)
    .bind(enrolled_at)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM test_enrollments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM test_enrollments WHERE user_id = $1 ORDER BY enrolled_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    exam_id: Option<i64>,
    page: Page,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM test_enrollments
         WHERE ($1::BIGINT IS NULL OR exam_id = $1)
         ORDER BY enrolled_at DESC, id DESC
         OFFSET $2 LIMIT $3"
    ))
    .bind(exam_id)
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool, exam_id: Option<i64>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM test_enrollments WHERE ($1::BIGINT IS NULL OR exam_id = $1)",
    )
    .bind(exam_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM test_enrollments WHERE id = $1").bind(id).execute(pool).await?;
    Ok(())
}
