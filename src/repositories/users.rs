use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::User;
use super::Page;

const COLUMNS: &str = "\
    id, email, hashed_password, full_name, is_admin, is_educator, is_active, \
    created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_email(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) email: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) full_name: &'a str,
    pub(crate) is_admin: bool,
    pub(crate) is_educator: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            email, hashed_password, full_name, is_admin, is_educator, is_active,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
        RETURNING {COLUMNS}",
    ))
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.full_name)
    .bind(params.is_admin)
    .bind(params.is_educator)
    .bind(params.is_active)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

#[derive(Debug, Default)]
pub(crate) struct UpdateUser {
    pub(crate) full_name: Option<String>,
    pub(crate) hashed_password: Option<String>,
    pub(crate) is_admin: Option<bool>,
    pub(crate) is_educator: Option<bool>,
    pub(crate) is_active: Option<bool>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: i64,
    params: UpdateUser,
    updated_at: PrimitiveDateTime,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            full_name = COALESCE($1, full_name),
            hashed_password = COALESCE($2, hashed_password),
            is_admin = COALESCE($3, is_admin),
            is_educator = COALESCE($4, is_educator),
            is_active = COALESCE($5, is_active),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.full_name)
    .bind(params.hashed_password)
    .bind(params.is_admin)
    .bind(params.is_educator)
    .bind(params.is_active)
    .bind(updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

#[derive(Debug, Default)]
pub(crate) struct UserFilter {
    pub(crate) email: Option<String>,
    pub(crate) is_admin: Option<bool>,
    pub(crate) is_educator: Option<bool>,
    pub(crate) is_active: Option<bool>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    builder.push(" WHERE TRUE");
    if let Some(email) = filter.email.as_ref() {
        builder.push(" AND email = ");
        builder.push_bind(email.clone());
    }
    if let Some(is_admin) = filter.is_admin {
        builder.push(" AND is_admin = ");
        builder.push_bind(is_admin);
    }
    if let Some(is_educator) = filter.is_educator {
        builder.push(" AND is_educator = ");
        builder.push_bind(is_educator);
    }
    if let Some(is_active) = filter.is_active {
        builder.push(" AND is_active = ");
        builder.push_bind(is_active);
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &UserFilter,
    page: Page,
) -> Result<Vec<User>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users"));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY id OFFSET ");
    builder.push_bind(page.skip);
    builder.push(" LIMIT ");
    builder.push_bind(page.limit);

    builder.build_query_as::<User>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &UserFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
    push_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
