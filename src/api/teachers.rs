use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
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
use crate::db::models::TeacherRecord;
use crate::db::types::PortalRole;
use crate::repositories;
use crate::schemas::teacher::{TeacherCreate, TeacherPatch, TeacherResponse};
use crate::services::access_policy::{self, Action, Decision, ResourceKind, ResourceRef};
use crate::services::phone;

#[derive(Debug, Deserialize)]
pub(crate) struct TeacherListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teachers).post(create_teacher))
        .route("/:teacher_id", get(get_teacher).patch(update_teacher).delete(delete_teacher))
}

async fn list_teachers(
    Query(params): Query<TeacherListQuery>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<Vec<TeacherResponse>>, ApiError> {
    // A teacher sees colleagues in its own department, a student nobody.
    let scope = access_policy::scope(&principal, ResourceKind::Teacher);
    let records =
        repositories::teachers::list_scoped(state.db(), &scope, params.skip, params.limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list teachers"))?;

    Ok(Json(records.into_iter().map(TeacherResponse::from_db).collect()))
}

async fn get_teacher(
    Path(teacher_id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<TeacherResponse>, ApiError> {
    let record = fetch_teacher(&state, &teacher_id).await?;

    // Reads follow the list scope: own department for staff, all for root.
    let scope = access_policy::scope(&principal, ResourceKind::Teacher);
    let own_account = principal.role == PortalRole::Teacher && principal.id == record.id;
    if !(own_account || scope.permits(Some(record.department), &record.id)) {
        return Err(ApiError::Forbidden("department mismatch"));
    }

    Ok(Json(TeacherResponse::from_db(record)))
}

async fn create_teacher(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(payload): Json<TeacherCreate>,
) -> Result<(StatusCode, Json<TeacherResponse>), ApiError> {
    validate_payload(&payload)?;

    let department = match principal.role {
        PortalRole::DepartmentAdmin => principal
            .department
            .ok_or(ApiError::Forbidden("acting admin has no department"))?,
        _ => payload
            .department
            .ok_or_else(|| ApiError::BadRequest("department is required".to_string()))?,
    };

    let gate = ResourceRef {
        kind: ResourceKind::Teacher,
        department: Some(department),
        owner_id: String::new(),
    };
    if let Decision::Deny(reason) = access_policy::authorize(&principal, Action::Create, &gate) {
        return Err(ApiError::Forbidden(reason));
    }

    let existing = repositories::teachers::exists_by_email(state.db(), &payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing teacher"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("email already exists".to_string()));
    }

    let mobile_no = normalize_phone(payload.mobile_no)?;

    // Absent password defaults to the email local part, pending a forced
    // change on first login.
    let (password, is_first_login) = match payload.password {
        Some(password) => {
            validate_password_len(&password)?;
            (password, false)
        }
        None => {
            let local_part =
                payload.email.split('@').next().unwrap_or(payload.email.as_str()).to_string();
            (local_part, true)
        }
    };

    let hashed_password = security::hash_password(&password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let now = primitive_now_utc();

    let record = repositories::teachers::create(
        state.db(),
        repositories::teachers::CreateTeacher {
            id: &Uuid::new_v4().to_string(),
            full_name: &payload.full_name,
            email: &payload.email,
            hashed_password,
            department,
            qualification: &payload.qualification,
            year_of_experience: payload.year_of_experience,
            mobile_no,
            address: payload.address,
            is_first_login,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create teacher"))?;

    tracing::info!(
        actor_id = %principal.id,
        teacher_id = %record.id,
        action = "teacher_create",
        "Created teacher"
    );

    Ok((StatusCode::CREATED, Json(TeacherResponse::from_db(record))))
}

async fn update_teacher(
    Path(teacher_id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(mut payload): Json<TeacherPatch>,
) -> Result<Json<TeacherResponse>, ApiError> {
    let record = fetch_teacher(&state, &teacher_id).await?;

    let resource = ResourceRef {
        kind: ResourceKind::Teacher,
        department: Some(record.department),
        owner_id: record.id.clone(),
    };
    if let Decision::Deny(reason) = access_policy::authorize(&principal, Action::Update, &resource)
    {
        return Err(ApiError::Forbidden(reason));
    }

    payload.mobile_no = normalize_phone(payload.mobile_no)?;

    repositories::teachers::update(
        state.db(),
        &record.id,
        repositories::teachers::UpdateTeacher {
            qualification: payload.qualification,
            year_of_experience: payload.year_of_experience,
            mobile_no: payload.mobile_no,
            address: payload.address,
            photo_url: payload.photo_url,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update teacher"))?;

    let updated = repositories::teachers::fetch_one_by_id(state.db(), &record.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated teacher"))?;

    tracing::info!(
        actor_id = %principal.id,
        teacher_id = %updated.id,
        action = "teacher_update",
        "Updated teacher"
    );

    Ok(Json(TeacherResponse::from_db(updated)))
}

async fn delete_teacher(
    Path(teacher_id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let record = fetch_teacher(&state, &teacher_id).await?;

    let resource = ResourceRef {
        kind: ResourceKind::Teacher,
        department: Some(record.department),
        owner_id: record.id.clone(),
    };
    if let Decision::Deny(reason) = access_policy::authorize(&principal, Action::Delete, &resource)
    {
        return Err(ApiError::Forbidden(reason));
    }

    repositories::teachers::delete(state.db(), &record.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete teacher"))?;

    tracing::info!(
        actor_id = %principal.id,
        teacher_id = %record.id,
        action = "teacher_delete",
        "Deleted teacher"
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_teacher(state: &AppState, teacher_id: &str) -> Result<TeacherRecord, ApiError> {
    repositories::teachers::find_by_id(state.db(), teacher_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?
        .ok_or_else(|| ApiError::NotFound("Teacher not found".to_string()))
}

fn normalize_phone(value: Option<String>) -> Result<Option<String>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => phone::normalize(&raw).map(Some).ok_or_else(|| {
            ApiError::BadRequest("Mobile_No must normalize to exactly 10 digits".to_string())
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
}
