use serde::{Deserialize, Serialize};

/// One spreadsheet row as handed over by the frontend after CSV parsing.
/// Everything arrives stringly typed; the import service owns all coercion.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ImportRow {
    #[serde(default)]
    #[serde(alias = "registrationNumber")]
    pub(crate) registration_number: String,
    #[serde(default)]
    #[serde(alias = "fullName")]
    pub(crate) full_name: String,
    #[serde(default)]
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) department: String,
    #[serde(default)]
    #[serde(alias = "class")]
    pub(crate) class_year: String,
    #[serde(default)]
    #[serde(alias = "currentSemester")]
    pub(crate) current_semester: serde_json::Value,
    #[serde(default)]
    pub(crate) gender: String,
    #[serde(default)]
    #[serde(alias = "Mobile_No")]
    pub(crate) mobile_no: String,
    #[serde(default)]
    #[serde(alias = "Parent_No")]
    pub(crate) parent_no: String,
    #[serde(default)]
    pub(crate) address: String,
    #[serde(default)]
    #[serde(alias = "externalId")]
    pub(crate) external_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImportRequest {
    pub(crate) rows: Vec<ImportRow>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportResponse {
    pub(crate) created_count: usize,
    pub(crate) error_count: usize,
    pub(crate) created: Vec<CreatedStudentRef>,
    pub(crate) errors: Vec<ImportRowFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreatedStudentRef {
    pub(crate) id: String,
    pub(crate) registration_number: String,
}

/// 1-based row number plus whichever identifying field the row carried.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ImportRowFailure {
    pub(crate) row: usize,
    pub(crate) identifier: String,
    pub(crate) reason: String,
}
