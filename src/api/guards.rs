use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::types::PortalRole;
use crate::repositories;
use crate::services::access_policy::Principal;

/// Any authenticated portal account, rehydrated from the table the token's
/// role points at.
pub(crate) struct CurrentPrincipal(pub(crate) Principal);

/// Shortcut for routes that are super-admin territory outright, so handlers
/// skip per-resource checks that could never pass for anyone else.
pub(crate) struct CurrentSuperAdmin(pub(crate) Principal);

#[async_trait]
impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let principal = match claims.role {
            PortalRole::Student => {
                repositories::students::find_by_id(app_state.db(), &claims.sub)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to load student account"))?
                    .map(|record| Principal {
                        id: record.id,
                        role: PortalRole::Student,
                        department: Some(record.department),
                    })
            }
            PortalRole::Teacher => {
                repositories::teachers::find_by_id(app_state.db(), &claims.sub)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to load teacher account"))?
                    .map(|record| Principal {
                        id: record.id,
                        role: PortalRole::Teacher,
                        department: Some(record.department),
                    })
            }
            PortalRole::DepartmentAdmin | PortalRole::SuperAdmin => {
                repositories::admins::find_by_id(app_state.db(), &claims.sub)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to load admin account"))?
                    // A demoted or promoted admin invalidates tokens minted
                    // under the old role.
                    .filter(|record| PortalRole::from(record.role) == claims.role)
                    .map(|record| Principal {
                        id: record.id,
                        role: claims.role,
                        department: record.department,
                    })
            }
        };

        principal.map(CurrentPrincipal).ok_or(ApiError::Unauthorized("Account not found"))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSuperAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentPrincipal(principal) = CurrentPrincipal::from_request_parts(parts, state).await?;

        if principal.role == PortalRole::SuperAdmin {
            Ok(CurrentSuperAdmin(principal))
        } else {
            Err(ApiError::Forbidden("Super admin access required"))
        }
    }
}
