use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::AdminRecord;
use crate::db::types::{AdminRole, Department};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminCreate {
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub(crate) full_name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub(crate) password: String,
    pub(crate) role: AdminRole,
    /// Required for department admins, rejected for super admins.
    #[serde(default)]
    pub(crate) department: Option<Department>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AdminPatch {
    #[serde(default)]
    #[serde(alias = "fullName")]
    pub(crate) full_name: Option<String>,
    #[serde(default)]
    pub(crate) department: Option<Department>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminResponse {
    pub(crate) id: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) role: AdminRole,
    pub(crate) department: Option<Department>,
    pub(crate) is_first_login: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AdminResponse {
    pub(crate) fn from_db(record: AdminRecord) -> Self {
        Self {
            id: record.id,
            full_name: record.full_name,
            email: record.email,
            role: record.role,
            department: record.department,
            is_first_login: record.is_first_login,
            created_at: format_primitive(record.created_at),
            updated_at: format_primitive(record.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_create_parses_snake_case_role() {
        let body = serde_json::json!({
            "full_name": "Dept Admin",
            "email": "dept@college.edu",
            "password": "strong-password",
            "role": "department_admin",
            "department": "ENTC"
        });
        let create: AdminCreate = serde_json::from_value(body).expect("create");
        assert_eq!(create.role, AdminRole::DepartmentAdmin);
        assert_eq!(create.department, Some(Department::Entc));
    }
}
