use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentPrincipal;
use crate::api::validation::{validate_password_len, validate_payload};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{Department, PortalRole};
use crate::repositories;
use crate::schemas::auth::{ChangePasswordRequest, LoginRequest, PrincipalResponse, TokenResponse};
use crate::services::access_policy::Principal;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/change-password", post(change_password))
        .route("/me", get(me))
}

/// Flattened view over the three account tables, so login and profile
/// endpoints do not care which one the credentials live in.
struct Account {
    id: String,
    full_name: String,
    email: String,
    hashed_password: String,
    role: PortalRole,
    department: Option<Department>,
    is_first_login: bool,
}

impl Account {
    fn into_principal_response(self) -> PrincipalResponse {
        PrincipalResponse {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            role: self.role,
            department: self.department,
            is_first_login: self.is_first_login,
        }
    }
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    validate_payload(&payload)?;

    let account = find_account_by_email(&state, &payload.email)
        .await?
        .ok_or(ApiError::Unauthorized("Incorrect email or password"))?;

    let verified = security::verify_password(&payload.password, &account.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect email or password"))?;

    if !verified {
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    let token = security::create_access_token(&account.id, account.role, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(account_id = %account.id, role = ?account.role, action = "login", "Login");

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
        principal: account.into_principal_response(),
    }))
}

async fn change_password(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<PrincipalResponse>, ApiError> {
    let account = load_account(&state, &principal)
        .await?
        .ok_or(ApiError::Unauthorized("Account not found"))?;

    let verified = security::verify_password(&payload.current_password, &account.hashed_password)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
    }

    validate_password_len(&payload.new_password)?;

    let hashed_password = security::hash_password(&payload.new_password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let now = primitive_now_utc();

    match principal.role {
        PortalRole::Student => {
            repositories::students::update_password(state.db(), &principal.id, hashed_password, now)
                .await
        }
        PortalRole::Teacher => {
            repositories::teachers::update_password(state.db(), &principal.id, hashed_password, now)
                .await
        }
        PortalRole::DepartmentAdmin | PortalRole::SuperAdmin => {
            repositories::admins::update_password(state.db(), &principal.id, hashed_password, now)
                .await
        }
    }
    .map_err(|e| ApiError::internal(e, "Failed to update password"))?;

    let updated = load_account(&state, &principal)
        .await?
        .ok_or(ApiError::Unauthorized("Account not found"))?;

    tracing::info!(account_id = %principal.id, action = "change_password", "Password changed");

    Ok(Json(updated.into_principal_response()))
}

async fn me(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<PrincipalResponse>, ApiError> {
    let account = load_account(&state, &principal)
        .await?
        .ok_or(ApiError::Unauthorized("Account not found"))?;

    Ok(Json(account.into_principal_response()))
}

/// Tables are probed admins first so a rare shared email resolves to the
/// most privileged account, matching how accounts are provisioned.
async fn find_account_by_email(
    state: &AppState,
    email: &str,
) -> Result<Option<Account>, ApiError> {
    if let Some(record) = repositories::admins::find_by_email(state.db(), email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load admin account"))?
    {
        return Ok(Some(Account {
            id: record.id,
            full_name: record.full_name,
            email: record.email,
            hashed_password: record.hashed_password,
            role: record.role.into(),
            department: record.department,
            is_first_login: record.is_first_login,
        }));
    }

    if let Some(record) = repositories::teachers::find_by_email(state.db(), email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load teacher account"))?
    {
        return Ok(Some(Account {
            id: record.id,
            full_name: record.full_name,
            email: record.email,
            hashed_password: record.hashed_password,
            role: PortalRole::Teacher,
            department: Some(record.department),
            is_first_login: record.is_first_login,
        }));
    }

    if let Some(record) = repositories::students::find_by_email(state.db(), email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student account"))?
    {
        return Ok(Some(Account {
            id: record.id,
            full_name: record.full_name,
            email: record.email,
            hashed_password: record.hashed_password,
            role: PortalRole::Student,
            department: Some(record.department),
            is_first_login: record.is_first_login,
        }));
    }

    Ok(None)
}

async fn load_account(
    state: &AppState,
    principal: &Principal,
) -> Result<Option<Account>, ApiError> {
    let account = match principal.role {
        PortalRole::Student => repositories::students::find_by_id(state.db(), &principal.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load student account"))?
            .map(|record| Account {
                id: record.id,
                full_name: record.full_name,
                email: record.email,
                hashed_password: record.hashed_password,
                role: PortalRole::Student,
                department: Some(record.department),
                is_first_login: record.is_first_login,
            }),
        PortalRole::Teacher => repositories::teachers::find_by_id(state.db(), &principal.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load teacher account"))?
            .map(|record| Account {
                id: record.id,
                full_name: record.full_name,
                email: record.email,
                hashed_password: record.hashed_password,
                role: PortalRole::Teacher,
                department: Some(record.department),
                is_first_login: record.is_first_login,
            }),
        PortalRole::DepartmentAdmin | PortalRole::SuperAdmin => {
            repositories::admins::find_by_id(state.db(), &principal.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load admin account"))?
                .map(|record| Account {
                    id: record.id,
                    full_name: record.full_name,
                    email: record.email,
                    hashed_password: record.hashed_password,
                    role: record.role.into(),
                    department: record.department,
                    is_first_login: record.is_first_login,
                })
        }
    };

    Ok(account)
}
