use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AdminRole, ClassYear, Department, Gender};

/// One attendance figure per completed semester. Uniqueness per semester and
/// the `semester < current_semester` bound are enforced by the record mutator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct AttendanceEntry {
    pub(crate) semester: i32,
    pub(crate) average_attendance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct SemesterProgressEntry {
    pub(crate) semester: i32,
    pub(crate) percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentRecord {
    pub(crate) id: String,
    pub(crate) registration_number: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) department: Department,
    pub(crate) class_year: ClassYear,
    pub(crate) current_semester: i32,
    pub(crate) class_rank: i32,
    pub(crate) previous_cgpa: Json<Vec<f64>>,
    pub(crate) previous_percentages: Json<Vec<f64>>,
    pub(crate) attendance: Json<Vec<AttendanceEntry>>,
    pub(crate) semester_progress: Json<Vec<SemesterProgressEntry>>,
    pub(crate) achievements: Json<Vec<String>>,
    pub(crate) mobile_no: Option<String>,
    pub(crate) parent_no: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) gender: Gender,
    pub(crate) photo_url: Option<String>,
    pub(crate) is_first_login: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TeacherRecord {
    pub(crate) id: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) department: Department,
    pub(crate) qualification: String,
    pub(crate) year_of_experience: i32,
    pub(crate) mobile_no: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) photo_url: Option<String>,
    pub(crate) is_first_login: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AdminRecord {
    pub(crate) id: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) role: AdminRole,
    pub(crate) department: Option<Department>,
    pub(crate) is_first_login: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
