use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::TeacherRecord;
use crate::db::types::Department;
use crate::services::access_policy::RecordScope;

const COLUMNS: &str = "\
    id, full_name, email, hashed_password, department, qualification, \
    year_of_experience, mobile_no, address, photo_url, is_first_login, \
    created_at, updated_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<TeacherRecord>, sqlx::Error> {
    sqlx::query_as::<_, TeacherRecord>(&format!("SELECT {COLUMNS} FROM teachers WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<TeacherRecord>, sqlx::Error> {
    sqlx::query_as::<_, TeacherRecord>(&format!("SELECT {COLUMNS} FROM teachers WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM teachers WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_scoped(
    pool: &PgPool,
    scope: &RecordScope,
    skip: i64,
    limit: i64,
) -> Result<Vec<TeacherRecord>, sqlx::Error> {
    if *scope == RecordScope::Nothing {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM teachers"));

    match scope {
        RecordScope::All | RecordScope::Nothing => {}
        RecordScope::Department(department) => {
            builder.push(" WHERE department = ");
            builder.push_bind(*department);
        }
        RecordScope::OwnRecord(id) => {
            builder.push(" WHERE id = ");
            builder.push_bind(id.clone());
        }
    }

    builder.push(" ORDER BY full_name");
    builder.push(" OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<TeacherRecord>().fetch_all(pool).await
}

pub(crate) struct CreateTeacher<'a> {
    pub id: &'a str,
    pub full_name: &'a str,
    pub email: &'a str,
    pub hashed_password: String,
    pub department: Department,
    pub qualification: &'a str,
    pub year_of_experience: i32,
    pub mobile_no: Option<String>,
    pub address: Option<String>,
    pub is_first_login: bool,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateTeacher<'_>,
) -> Result<TeacherRecord, sqlx::Error> {
    sqlx::query_as::<_, TeacherRecord>(&format!(
        "INSERT INTO teachers (
            id, full_name, email, hashed_password, department, qualification,
            year_of_experience, mobile_no, address, photo_url, is_first_login,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.full_name)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.department)
    .bind(params.qualification)
    .bind(params.year_of_experience)
    .bind(params.mobile_no)
    .bind(params.address)
    .bind(Option::<String>::None)
    .bind(params.is_first_login)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateTeacher {
    pub qualification: Option<String>,
    pub year_of_experience: Option<i32>,
    pub mobile_no: Option<String>,
    pub address: Option<String>,
    pub photo_url: Option<String>,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateTeacher,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE teachers SET
            qualification = COALESCE($1, qualification),
            year_of_experience = COALESCE($2, year_of_experience),
            mobile_no = COALESCE($3, mobile_no),
            address = COALESCE($4, address),
            photo_url = COALESCE($5, photo_url),
            updated_at = $6
         WHERE id = $7",
    )
    .bind(params.qualification)
    .bind(params.year_of_experience)
    .bind(params.mobile_no)
    .bind(params.address)
    .bind(params.photo_url)
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
        "UPDATE teachers SET hashed_password = $1, is_first_login = FALSE, updated_at = $2
         WHERE id = $3",
    )
    .bind(hashed_password)
    .bind(updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn fetch_one_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<TeacherRecord, sqlx::Error> {
    sqlx::query_as::<_, TeacherRecord>(&format!("SELECT {COLUMNS} FROM teachers WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM teachers WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}
