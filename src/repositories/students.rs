use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::{AttendanceEntry, SemesterProgressEntry, StudentRecord};
use crate::db::types::{ClassYear, Department, Gender};
use crate::services::access_policy::RecordScope;

const COLUMNS: &str = "\
    id, registration_number, full_name, email, hashed_password, department, \
    class_year, current_semester, class_rank, previous_cgpa, previous_percentages, \
    attendance, semester_progress, achievements, mobile_no, parent_no, address, \
    gender, photo_url, is_first_login, created_at, updated_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<StudentRecord>, sqlx::Error> {
    sqlx::query_as::<_, StudentRecord>(&format!("SELECT {COLUMNS} FROM students WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<StudentRecord>, sqlx::Error> {
    sqlx::query_as::<_, StudentRecord>(&format!("SELECT {COLUMNS} FROM students WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Which unique key an incoming row collides with, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyConflict {
    Email,
    RegistrationNumber,
    ExternalId,
}

impl KeyConflict {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            KeyConflict::Email => "email already exists",
            KeyConflict::RegistrationNumber => "registration number already exists",
            KeyConflict::ExternalId => "external id already exists",
        }
    }
}

pub(crate) async fn find_key_conflict(
    pool: &PgPool,
    email: &str,
    registration_number: &str,
    external_id: Option<&str>,
) -> Result<Option<KeyConflict>, sqlx::Error> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        "SELECT email, registration_number, id FROM students
         WHERE email = $1 OR registration_number = $2 OR id = $3
         LIMIT 1",
    )
    .bind(email)
    .bind(registration_number)
    .bind(external_id.unwrap_or(""))
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(found_email, found_registration, _)| {
        if found_email == email {
            KeyConflict::Email
        } else if found_registration == registration_number {
            KeyConflict::RegistrationNumber
        } else {
            KeyConflict::ExternalId
        }
    }))
}

pub(crate) async fn list_scoped(
    pool: &PgPool,
    scope: &RecordScope,
    skip: i64,
    limit: i64,
) -> Result<Vec<StudentRecord>, sqlx::Error> {
    if *scope == RecordScope::Nothing {
        return Ok(Vec::new());
    }

    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM students"));

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

    builder.push(" ORDER BY registration_number");
    builder.push(" OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<StudentRecord>().fetch_all(pool).await
}

pub(crate) async fn list_by_department(
    pool: &PgPool,
    department: Department,
) -> Result<Vec<StudentRecord>, sqlx::Error> {
    sqlx::query_as::<_, StudentRecord>(&format!(
        "SELECT {COLUMNS} FROM students WHERE department = $1 ORDER BY registration_number"
    ))
    .bind(department)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateStudent<'a> {
    pub id: &'a str,
    pub registration_number: &'a str,
    pub full_name: &'a str,
    pub email: &'a str,
    pub hashed_password: String,
    pub department: Department,
    pub class_year: ClassYear,
    pub current_semester: i32,
    pub gender: Gender,
    pub mobile_no: Option<String>,
    pub parent_no: Option<String>,
    pub address: Option<String>,
    pub is_first_login: bool,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateStudent<'_>,
) -> Result<StudentRecord, sqlx::Error> {
    // History arrays start as neutral zeros for already-completed semesters
    // so the length invariant holds from the first read.
    let completed = (params.current_semester - 1).max(0) as usize;
    let history = vec![0.0_f64; completed];

    sqlx::query_as::<_, StudentRecord>(&format!(
        "INSERT INTO students (
            id, registration_number, full_name, email, hashed_password, department,
            class_year, current_semester, class_rank, previous_cgpa, previous_percentages,
            attendance, semester_progress, achievements, mobile_no, parent_no, address,
            gender, photo_url, is_first_login, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.registration_number)
    .bind(params.full_name)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.department)
    .bind(params.class_year)
    .bind(params.current_semester)
    .bind(0_i32)
    .bind(Json(history.clone()))
    .bind(Json(history))
    .bind(Json(Vec::<AttendanceEntry>::new()))
    .bind(Json(Vec::<SemesterProgressEntry>::new()))
    .bind(Json(Vec::<String>::new()))
    .bind(params.mobile_no)
    .bind(params.parent_no)
    .bind(params.address)
    .bind(params.gender)
    .bind(Option::<String>::None)
    .bind(params.is_first_login)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

/// Persist a record mutated by the record-update service. Identity and
/// credential columns are deliberately not part of this statement.
pub(crate) async fn save_record(
    pool: &PgPool,
    record: &StudentRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE students SET
            current_semester = $1,
            class_rank = $2,
            previous_cgpa = $3,
            previous_percentages = $4,
            attendance = $5,
            semester_progress = $6,
            achievements = $7,
            mobile_no = $8,
            parent_no = $9,
            address = $10,
            photo_url = $11,
            updated_at = $12
         WHERE id = $13",
    )
    .bind(record.current_semester)
    .bind(record.class_rank)
    .bind(&record.previous_cgpa)
    .bind(&record.previous_percentages)
    .bind(&record.attendance)
    .bind(&record.semester_progress)
    .bind(&record.achievements)
    .bind(&record.mobile_no)
    .bind(&record.parent_no)
    .bind(&record.address)
    .bind(&record.photo_url)
    .bind(record.updated_at)
    .bind(&record.id)
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
        "UPDATE students SET hashed_password = $1, is_first_login = FALSE, updated_at = $2
         WHERE id = $3",
    )
    .bind(hashed_password)
    .bind(updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM students WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}
