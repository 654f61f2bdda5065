use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentPrincipal;
use crate::api::validation::{validate_password_len, validate_payload};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::StudentRecord;
use crate::db::types::{Department, PortalRole};
use crate::repositories;
use crate::schemas::import::{ImportRequest, ImportResponse};
use crate::schemas::student::{StudentCreate, StudentPatch, StudentResponse};
use crate::services::access_policy::{self, Action, Decision, Principal, ResourceKind, ResourceRef};
use crate::services::student_import::{self, ImportError};
use crate::services::{phone, record_update};

#[derive(Debug, Deserialize)]
pub(crate) struct StudentListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/import", post(import_students))
        .route("/:student_id", get(get_student).patch(update_student).delete(delete_student))
}

async fn list_students(
    Query(params): Query<StudentListQuery>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    let scope = access_policy::scope(&principal, ResourceKind::Student);
    let records =
        repositories::students::list_scoped(state.db(), &scope, params.skip, params.limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    Ok(Json(records.into_iter().map(StudentResponse::from_db).collect()))
}

async fn get_student(
    Path(student_id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<StudentResponse>, ApiError> {
    let record = fetch_student(&state, &student_id).await?;
    check(&principal, Action::Read, &record)?;

    Ok(Json(StudentResponse::from_db(record)))
}

async fn create_student(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(payload): Json<StudentCreate>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiError> {
    validate_payload(&payload)?;

    let department = resolve_department(&principal, payload.department)?;
    let gate = ResourceRef {
        kind: ResourceKind::Student,
        department: Some(department),
        owner_id: String::new(),
    };
    if let Decision::Deny(reason) = access_policy::authorize(&principal, Action::Create, &gate) {
        return Err(ApiError::Forbidden(reason));
    }

    let mobile_no = normalize_phone(payload.mobile_no, "Mobile_No")?;
    let parent_no = normalize_phone(payload.parent_no, "Parent_No")?;

    let conflict = repositories::students::find_key_conflict(
        state.db(),
        &payload.email,
        &payload.registration_number,
        None,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to check existing student"))?;
    if let Some(conflict) = conflict {
        return Err(ApiError::Conflict(conflict.describe().to_string()));
    }

    // Absent password means the registration number, pending a forced change
    // on first login.
    let (password, is_first_login) = match payload.password {
        Some(password) => {
            validate_password_len(&password)?;
            (password, false)
        }
        None => (payload.registration_number.clone(), true),
    };

    let hashed_password = security::hash_password(&password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let now = primitive_now_utc();

    let record = repositories::students::create(
        state.db(),
        repositories::students::CreateStudent {
            id: &Uuid::new_v4().to_string(),
            registration_number: &payload.registration_number,
            full_name: &payload.full_name,
            email: &payload.email,
            hashed_password,
            department,
            class_year: payload.class_year,
            current_semester: payload.current_semester,
            gender: payload.gender,
            mobile_no,
            parent_no,
            address: payload.address,
            is_first_login,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create student"))?;

    tracing::info!(
        actor_id = %principal.id,
        student_id = %record.id,
        action = "student_create",
        "Created student"
    );

    Ok((StatusCode::CREATED, Json(StudentResponse::from_db(record))))
}

async fn update_student(
    Path(student_id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(mut payload): Json<StudentPatch>,
) -> Result<Json<StudentResponse>, ApiError> {
    let mut record = fetch_student(&state, &student_id).await?;
    check(&principal, Action::Update, &record)?;

    payload.mobile_no = normalize_phone(payload.mobile_no, "Mobile_No")?;
    payload.parent_no = normalize_phone(payload.parent_no, "Parent_No")?;

    record_update::apply_student_patch(&mut record, payload)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    record.updated_at = primitive_now_utc();

    repositories::students::save_record(state.db(), &record)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update student"))?;

    tracing::info!(
        actor_id = %principal.id,
        student_id = %record.id,
        action = "student_update",
        "Updated student record"
    );

    Ok(Json(StudentResponse::from_db(record)))
}

async fn delete_student(
    Path(student_id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let record = fetch_student(&state, &student_id).await?;
    check(&principal, Action::Delete, &record)?;

    repositories::students::delete(state.db(), &record.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete student"))?;

    tracing::info!(
        actor_id = %principal.id,
        student_id = %record.id,
        action = "student_delete",
        "Deleted student"
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn import_students(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    let max_rows = state.settings().import().max_batch_rows;

    let outcome = student_import::import_batch(state.db(), &principal, payload.rows, max_rows)
        .await
        .map_err(|e| match e {
            ImportError::Forbidden(reason) => ApiError::Forbidden(reason),
            ImportError::BatchTooLarge(_) => ApiError::BadRequest(e.to_string()),
            ImportError::Database(err) => ApiError::internal(err, "Failed to import students"),
            ImportError::Hashing => ApiError::internal(e, "Failed to import students"),
        })?;

    Ok(Json(ImportResponse {
        created_count: outcome.created.len(),
        error_count: outcome.errors.len(),
        created: outcome.created,
        errors: outcome.errors,
    }))
}

async fn fetch_student(state: &AppState, student_id: &str) -> Result<StudentRecord, ApiError> {
    repositories::students::find_by_id(state.db(), student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))
}

fn check(principal: &Principal, action: Action, record: &StudentRecord) -> Result<(), ApiError> {
    let resource = ResourceRef {
        kind: ResourceKind::Student,
        department: Some(record.department),
        owner_id: record.id.clone(),
    };
    match access_policy::authorize(principal, action, &resource) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(ApiError::Forbidden(reason)),
    }
}

fn resolve_department(
    principal: &Principal,
    requested: Option<Department>,
) -> Result<Department, ApiError> {
    match principal.role {
        PortalRole::DepartmentAdmin => principal
            .department
            .ok_or(ApiError::Forbidden("acting admin has no department")),
        PortalRole::SuperAdmin => requested
            .or(principal.department)
            .ok_or_else(|| ApiError::BadRequest("department is required".to_string())),
        PortalRole::Teacher | PortalRole::Student => {
            requested.or(principal.department).ok_or(ApiError::Forbidden("no applicable rule"))
        }
    }
}

fn normalize_phone(value: Option<String>, field: &str) -> Result<Option<String>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => phone::normalize(&raw).map(Some).ok_or_else(|| {
            ApiError::BadRequest(format!("{field} must normalize to exactly 10 digits"))
        }),
    }
}

fn default_limit() -> i64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_is_positive() {
        assert!(default_limit() > 0);
    }

    #[test]
    fn department_admin_creates_into_own_department_only() {
        let admin = Principal {
            id: "admin-1".to_string(),
            role: PortalRole::DepartmentAdmin,
            department: Some(Department::Entc),
        };
        // Requested departments are overridden, not honored.
        assert!(matches!(
            resolve_department(&admin, Some(Department::Cse)),
            Ok(Department::Entc)
        ));
    }

    #[test]
    fn super_admin_must_name_a_department() {
        let admin = Principal {
            id: "admin-1".to_string(),
            role: PortalRole::SuperAdmin,
            department: None,
        };
        assert!(matches!(
            resolve_department(&admin, Some(Department::Mech)),
            Ok(Department::Mech)
        ));
        assert!(resolve_department(&admin, None).is_err());
    }

    #[test]
    fn blank_phone_is_treated_as_absent() {
        assert!(normalize_phone(Some("  ".to_string()), "Mobile_No").unwrap().is_none());
        assert!(normalize_phone(None, "Mobile_No").unwrap().is_none());
        assert_eq!(
            normalize_phone(Some("9876543210".to_string()), "Mobile_No").unwrap().as_deref(),
            Some("9876543210")
        );
        assert!(normalize_phone(Some("123".to_string()), "Mobile_No").is_err());
    }
}
