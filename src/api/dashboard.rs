use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentPrincipal;
use crate::core::state::AppState;
use crate::db::types::{Department, PortalRole};
use crate::repositories;
use crate::services::academics::{self, DepartmentPerformance};

#[derive(Debug, Deserialize)]
pub(crate) struct PerformanceQuery {
    #[serde(default)]
    department: Option<Department>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DepartmentPerformanceResponse {
    department: Department,
    #[serde(flatten)]
    performance: DepartmentPerformance,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/performance", get(performance))
}

/// Radar chart feed. Department-scoped staff get their own department; a
/// super admin picks one with `?department=` or gets all five.
async fn performance(
    Query(params): Query<PerformanceQuery>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<Vec<DepartmentPerformanceResponse>>, ApiError> {
    let departments: Vec<Department> = match principal.role {
        PortalRole::Student => {
            return Err(ApiError::Forbidden("no applicable rule"));
        }
        PortalRole::DepartmentAdmin | PortalRole::Teacher => {
            let own = principal
                .department
                .ok_or(ApiError::Forbidden("acting account has no department"))?;
            if params.department.is_some_and(|requested| requested != own) {
                return Err(ApiError::Forbidden("department mismatch"));
            }
            vec![own]
        }
        PortalRole::SuperAdmin => match params.department {
            Some(department) => vec![department],
            None => Department::ALL.to_vec(),
        },
    };

    let mut response = Vec::with_capacity(departments.len());
    for department in departments {
        let records = repositories::students::list_by_department(state.db(), department)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load department cohort"))?;
        response.push(DepartmentPerformanceResponse {
            department,
            performance: academics::department_performance(&records),
        });
    }

    Ok(Json(response))
}
