use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::TeacherRecord;
use crate::db::types::Department;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TeacherCreate {
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub(crate) full_name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    /// Defaults to the email local part when absent (first-login flow).
    #[serde(default)]
    pub(crate) password: Option<String>,
    #[serde(default)]
    pub(crate) department: Option<Department>,
    #[validate(length(min = 1, message = "qualification must not be empty"))]
    pub(crate) qualification: String,
    #[serde(default)]
    #[serde(alias = "yearOfExperience")]
    #[validate(range(min = 0, max = 60, message = "year_of_experience must be between 0 and 60"))]
    pub(crate) year_of_experience: i32,
    #[serde(default)]
    #[serde(alias = "Mobile_No")]
    pub(crate) mobile_no: Option<String>,
    #[serde(default)]
    pub(crate) address: Option<String>,
}

/// Patchable teacher profile fields. Identity, department and credentials
/// are not part of this struct and are silently dropped from patch bodies.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TeacherPatch {
    #[serde(default)]
    pub(crate) qualification: Option<String>,
    #[serde(default)]
    #[serde(alias = "yearOfExperience")]
    pub(crate) year_of_experience: Option<i32>,
    #[serde(default)]
    #[serde(alias = "Mobile_No")]
    pub(crate) mobile_no: Option<String>,
    #[serde(default)]
    pub(crate) address: Option<String>,
    #[serde(default)]
    #[serde(alias = "photoUrl")]
    pub(crate) photo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeacherResponse {
    pub(crate) id: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) department: Department,
    pub(crate) qualification: String,
    pub(crate) year_of_experience: i32,
    pub(crate) mobile_no: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) photo_url: Option<String>,
    pub(crate) is_first_login: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl TeacherResponse {
    pub(crate) fn from_db(record: TeacherRecord) -> Self {
        Self {
            id: record.id,
            full_name: record.full_name,
            email: record.email,
            department: record.department,
            qualification: record.qualification,
            year_of_experience: record.year_of_experience,
            mobile_no: record.mobile_no,
            address: record.address,
            photo_url: record.photo_url,
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
    fn patch_drops_credential_and_identity_keys() {
        let body = serde_json::json!({
            "qualification": "PhD",
            "email": "new@college.edu",
            "hashed_password": "forged",
            "department": "MECH"
        });
        let patch: TeacherPatch = serde_json::from_value(body).expect("patch");
        assert_eq!(patch.qualification.as_deref(), Some("PhD"));
        assert!(patch.mobile_no.is_none());
    }
}
