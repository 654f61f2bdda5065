use sqlx::PgPool;

use crate::db::models::AdminRecord;
use crate::db::types::{AdminRole, Department};

const COLUMNS: &str = "\
    id, full_name, email, hashed_password, role, department, is_first_login, \
    created_at, updated_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AdminRecord>, sqlx::Error> {
    sqlx::query_as::<_, AdminRecord>(&format!("SELECT {COLUMNS} FROM admins WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<AdminRecord>, sqlx::Error> {
    sqlx::query_as::<_, AdminRecord>(&format!("SELECT {COLUMNS} FROM admins WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM admins WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<AdminRecord>, sqlx::Error> {
    sqlx::query_as::<_, AdminRecord>(&format!(
        "SELECT {COLUMNS} FROM admins ORDER BY created_at"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateAdmin<'a> {
    pub id: &'a str,
    pub full_name: &'a str,
    pub email: &'a str,
    pub hashed_password: String,
    pub role: AdminRole,
    pub department: Option<Department>,
    pub is_first_login: bool,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAdmin<'_>,
) -> Result<AdminRecord, sqlx::Error> {
    sqlx::query_as::<_, AdminRecord>(&format!(
        "INSERT INTO admins (
            id, full_name, email, hashed_password, role, department, is_first_login,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.full_name)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.role)
    .bind(params.department)
    .bind(params.is_first_login)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateAdmin {
    pub full_name: Option<String>,
    pub department: Option<Department>,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(pool: &PgPool, id: &str, params: UpdateAdmin) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE admins SET
            full_name = COALESCE($1, full_name),
            department = COALESCE($2, department),
            updated_at = $3
         WHERE id = $4",
    )
    .bind(params.full_name)
    .bind(params.department)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn update_password(
    pool: &PgPool,
    id: &str,
    hashed_password: String,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE admins SET hashed_password = $1, is_first_login = FALSE, updated_at = $2
         WHERE id = $3",
    )
    .bind(hashed_password)
    .bind(updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<AdminRecord, sqlx::Error> {
    sqlx::query_as::<_, AdminRecord>(&format!("SELECT {COLUMNS} FROM admins WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM admins WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}
