use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentSuperAdmin;
use crate::api::validation::validate_payload;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::AdminRecord;
use crate::db::types::AdminRole;
use crate::repositories;
use crate::schemas::admin::{AdminCreate, AdminPatch, AdminResponse};
use crate::services::access_policy::{self, Action, Decision, ResourceKind, ResourceRef};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_admins).post(create_admin))
        .route("/:admin_id", get(get_admin).patch(update_admin).delete(delete_admin))
}

async fn list_admins(
    CurrentSuperAdmin(_admin): CurrentSuperAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminResponse>>, ApiError> {
    let records = repositories::admins::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list admins"))?;

    Ok(Json(records.into_iter().map(AdminResponse::from_db).collect()))
}

async fn get_admin(
    Path(admin_id): Path<String>,
    CurrentSuperAdmin(_admin): CurrentSuperAdmin,
    State(state): State<AppState>,
) -> Result<Json<AdminResponse>, ApiError> {
    let record = fetch_admin(&state, &admin_id).await?;
    Ok(Json(AdminResponse::from_db(record)))
}

async fn create_admin(
    CurrentSuperAdmin(admin): CurrentSuperAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminCreate>,
) -> Result<(StatusCode, Json<AdminResponse>), ApiError> {
    validate_payload(&payload)?;

    match payload.role {
        AdminRole::DepartmentAdmin if payload.department.is_none() => {
            return Err(ApiError::BadRequest(
                "department is required for a department admin".to_string(),
            ));
        }
        AdminRole::SuperAdmin if payload.department.is_some() => {
            return Err(ApiError::BadRequest(
                "a super admin cannot be bound to a department".to_string(),
            ));
        }
        _ => {}
    }

    let existing = repositories::admins::exists_by_email(state.db(), &payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing admin"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let now = primitive_now_utc();

    let record = repositories::admins::create(
        state.db(),
        repositories::admins::CreateAdmin {
            id: &Uuid::new_v4().to_string(),
            full_name: &payload.full_name,
            email: &payload.email,
            hashed_password,
            role: payload.role,
            department: payload.department,
            is_first_login: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create admin"))?;

    tracing::info!(
        actor_id = %admin.id,
        admin_id = %record.id,
        action = "admin_create",
        "Created admin"
    );

    Ok((StatusCode::CREATED, Json(AdminResponse::from_db(record))))
}

async fn update_admin(
    Path(admin_id): Path<String>,
    CurrentSuperAdmin(admin): CurrentSuperAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminPatch>,
) -> Result<Json<AdminResponse>, ApiError> {
    let record = fetch_admin(&state, &admin_id).await?;

    if record.role == AdminRole::SuperAdmin && payload.department.is_some() {
        return Err(ApiError::BadRequest(
            "a super admin cannot be bound to a department".to_string(),
        ));
    }

    repositories::admins::update(
        state.db(),
        &record.id,
        repositories::admins::UpdateAdmin {
            full_name: payload.full_name,
            department: payload.department,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update admin"))?;

    let updated = repositories::admins::fetch_one_by_id(state.db(), &record.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated admin"))?;

    tracing::info!(
        actor_id = %admin.id,
        admin_id = %updated.id,
        action = "admin_update",
        "Updated admin"
    );

    Ok(Json(AdminResponse::from_db(updated)))
}

async fn delete_admin(
    Path(admin_id): Path<String>,
    CurrentSuperAdmin(admin): CurrentSuperAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let record = fetch_admin(&state, &admin_id).await?;

    let resource = ResourceRef {
        kind: ResourceKind::Admin,
        department: record.department,
        owner_id: record.id.clone(),
    };
    if let Decision::Deny(reason) = access_policy::authorize(&admin, Action::Delete, &resource) {
        return Err(ApiError::Forbidden(reason));
    }

    repositories::admins::delete(state.db(), &record.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete admin"))?;

    tracing::info!(
        actor_id = %admin.id,
        admin_id = %record.id,
        action = "admin_delete",
        "Deleted admin"
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_admin(state: &AppState, admin_id: &str) -> Result<AdminRecord, ApiError> {
    repositories::admins::find_by_id(state.db(), admin_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch admin"))?
        .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))
}
