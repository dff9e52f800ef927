use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Exam;
use super::Page;

pub(crate) const COLUMNS: &str = "\
    id, owner_id, title, description, duration_minutes, is_published, cover_image_key, \
    published_at, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateExam<'a> {
    pub(crate) owner_id: i64,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) duration_minutes: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            owner_id, title, description, duration_minutes, is_published, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,FALSE,$5,$5)
        RETURNING {COLUMNS}",
    ))
    .bind(params.owner_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.duration_minutes)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

#[derive(Debug, Default)]
pub(crate) struct UpdateExam {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: Option<i32>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: i64,
    params: UpdateExam,
    updated_at: PrimitiveDateTime,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            duration_minutes = COALESCE($3, duration_minutes),
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.duration_minutes)
    .bind(updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn publish(
    pool: &PgPool,
    id: i64,
    now: PrimitiveDateTime,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET is_published = TRUE, published_at = $1, updated_at = $1
         WHERE id = $2
         RETURNING {COLUMNS}",
    ))
    .bind(now)
    .bind(id)
    .fetch_one(pool)
    .await
}

/// Exam row after a cover write, with the key it replaced.
#[derive(Debug, FromRow)]
pub(crate) struct CoverReplaced {
    #[sqlx(flatten)]
    pub(crate) exam: Exam,
    pub(crate) previous_cover_image_key: Option<String>,
}

/// Swaps the cover key under a row lock. `None` when the exam is gone.
pub(crate) async fn set_cover_image(
    pool: &PgPool,
    id: i64,
    key: &str,
    now: PrimitiveDateTime,
) -> Result<Option<CoverReplaced>, sqlx::Error> {
    sqlx::query_as::<_, CoverReplaced>(&format!(
        "WITH previous AS (
             SELECT id AS exam_id, cover_image_key AS previous_cover_image_key
             FROM exams WHERE id = $3 FOR UPDATE
         )
         UPDATE exams SET cover_image_key = $1, updated_at = $2
         FROM previous
         WHERE exams.id = previous.exam_id
         RETURNING {COLUMNS}, previous.previous_cover_image_key",
    ))
    .bind(key)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Deletes the exam and returns the cover key it held, if any.
pub(crate) async fn delete_by_id(pool: &PgPool, id: i64) -> Result<Option<String>, sqlx::Error> {
    let deleted: Option<Option<String>> =
        sqlx::query_scalar("DELETE FROM exams WHERE id = $1 RETURNING cover_image_key")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(deleted.flatten())
}

pub(crate) async fn count_questions(pool: &PgPool, exam_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}

/// Row scope for exam listings. Handlers still check every row against the ability.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ExamScope {
    All,
    PublishedOrOwnedBy(i64),
    Published,
}

fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: ExamScope) {
    match scope {
        ExamScope::All => {
            builder.push(" WHERE TRUE");
        }
        ExamScope::PublishedOrOwnedBy(owner_id) => {
            builder.push(" WHERE (is_published = TRUE OR owner_id = ");
            builder.push_bind(owner_id);
            builder.push(")");
        }
        ExamScope::Published => {
            builder.push(" WHERE is_published = TRUE");
        }
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    scope: ExamScope,
    owner_id: Option<i64>,
    page: Page,
) -> Result<Vec<Exam>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM exams"));
    push_scope(&mut builder, scope);
    if let Some(owner_id) = owner_id {
        builder.push(" AND owner_id = ");
        builder.push_bind(owner_id);
    }
    builder.push(" ORDER BY created_at DESC, id DESC OFFSET ");
    builder.push_bind(page.skip);
    builder.push(" LIMIT ");
    builder.push_bind(page.limit);

    builder.build_query_as::<Exam>().fetch_all(pool).await
}

pub(crate) async fn count(
    pool: &PgPool,
    scope: ExamScope,
    owner_id: Option<i64>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM exams");
    push_scope(&mut builder, scope);
    if let Some(owner_id) = owner_id {
        builder.push(" AND owner_id = ");
        builder.push_bind(owner_id);
    }

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
