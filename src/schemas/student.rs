use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{AttendanceEntry, SemesterProgressEntry, StudentRecord};
use crate::db::types::{ClassYear, Department, Gender};
use crate::services::academics::{self, Summary};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentCreate {
    #[serde(alias = "registrationNumber")]
    #[validate(length(min = 1, message = "registration_number must not be empty"))]
    pub(crate) registration_number: String,
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, message = "full_name must not be empty"))]
    pub(crate) full_name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    /// Defaults to the registration number when absent (first-login flow).
    #[serde(default)]
    pub(crate) password: Option<String>,
    #[serde(default)]
    pub(crate) department: Option<Department>,
    #[serde(alias = "class")]
    pub(crate) class_year: ClassYear,
    #[serde(default = "default_semester")]
    #[serde(alias = "currentSemester")]
    #[validate(range(min = 1, max = 8, message = "current_semester must be between 1 and 8"))]
    pub(crate) current_semester: i32,
    pub(crate) gender: Gender,
    #[serde(default)]
    #[serde(alias = "Mobile_No")]
    pub(crate) mobile_no: Option<String>,
    #[serde(default)]
    #[serde(alias = "Parent_No")]
    pub(crate) parent_no: Option<String>,
    #[serde(default)]
    pub(crate) address: Option<String>,
}

/// The exact teacher/admin-on-student allow-list. Unknown keys in a patch
/// body deserialize to nothing and are dropped without error; fields outside
/// this struct (password, role, id) cannot be patched at all.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StudentPatch {
    #[serde(default)]
    #[serde(alias = "Mobile_No")]
    pub(crate) mobile_no: Option<String>,
    #[serde(default)]
    #[serde(alias = "Parent_No")]
    pub(crate) parent_no: Option<String>,
    #[serde(default)]
    pub(crate) previous_cgpa: Option<Vec<f64>>,
    #[serde(default)]
    pub(crate) previous_percentages: Option<Vec<f64>>,
    #[serde(default)]
    #[serde(alias = "classRank")]
    pub(crate) class_rank: Option<i32>,
    #[serde(default)]
    #[serde(alias = "currentSemester")]
    pub(crate) current_semester: Option<i32>,
    #[serde(default)]
    pub(crate) achievements: Option<Vec<String>>,
    #[serde(default)]
    #[serde(alias = "semesterProgress")]
    pub(crate) semester_progress: Option<Vec<SemesterProgressEntry>>,
    #[serde(default)]
    pub(crate) attendance: Option<Vec<AttendanceEntry>>,
    #[serde(default)]
    #[serde(alias = "photoUrl")]
    pub(crate) photo_url: Option<String>,
    #[serde(default)]
    pub(crate) address: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) registration_number: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) department: Department,
    pub(crate) class_year: ClassYear,
    pub(crate) current_semester: i32,
    pub(crate) class_rank: i32,
    pub(crate) previous_cgpa: Vec<f64>,
    pub(crate) previous_percentages: Vec<f64>,
    pub(crate) attendance: Vec<AttendanceEntry>,
    pub(crate) semester_progress: Vec<SemesterProgressEntry>,
    pub(crate) achievements: Vec<String>,
    pub(crate) mobile_no: Option<String>,
    pub(crate) parent_no: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) gender: Gender,
    pub(crate) photo_url: Option<String>,
    pub(crate) is_first_login: bool,
    pub(crate) summary: Summary,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl StudentResponse {
    pub(crate) fn from_db(record: StudentRecord) -> Self {
        let summary = academics::summarize(&record);
        Self {
            id: record.id,
            registration_number: record.registration_number,
            full_name: record.full_name,
            email: record.email,
            department: record.department,
            class_year: record.class_year,
            current_semester: record.current_semester,
            class_rank: record.class_rank,
            previous_cgpa: record.previous_cgpa.0,
            previous_percentages: record.previous_percentages.0,
            attendance: record.attendance.0,
            semester_progress: record.semester_progress.0,
            achievements: record.achievements.0,
            mobile_no: record.mobile_no,
            parent_no: record.parent_no,
            address: record.address,
            gender: record.gender,
            photo_url: record.photo_url,
            is_first_login: record.is_first_login,
            summary,
            created_at: format_primitive(record.created_at),
            updated_at: format_primitive(record.updated_at),
        }
    }
}

fn default_semester() -> i32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_drops_unknown_and_sensitive_keys() {
        let body = serde_json::json!({
            "class_rank": 3,
            "password": "sneaky",
            "role": "super_admin",
            "_id": "forged",
            "no_such_field": true
        });
        let patch: StudentPatch = serde_json::from_value(body).expect("patch");
        assert_eq!(patch.class_rank, Some(3));
        assert!(patch.mobile_no.is_none());
        assert!(patch.current_semester.is_none());
    }

    #[test]
    fn patch_accepts_legacy_field_aliases() {
        let body = serde_json::json!({
            "Mobile_No": "9876543210",
            "semesterProgress": [{"semester": 1, "percentage": 72.5}]
        });
        let patch: StudentPatch = serde_json::from_value(body).expect("patch");
        assert_eq!(patch.mobile_no.as_deref(), Some("9876543210"));
        assert_eq!(patch.semester_progress.unwrap().len(), 1);
    }
}
