use std::collections::HashSet;

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::security;
use crate::core::time::primitive_now_utc;
use crate::db::types::{ClassYear, Department, Gender, PortalRole};
use crate::repositories;
use crate::schemas::import::{CreatedStudentRef, ImportRow, ImportRowFailure};
use crate::services::access_policy::{self, Action, Principal, ResourceKind, ResourceRef};
use crate::services::phone;

#[derive(Debug, Error)]
pub(crate) enum ImportError {
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("import batch exceeds the limit of {0} rows")]
    BatchTooLarge(u64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed")]
    Hashing,
}

#[derive(Debug, Default)]
pub(crate) struct ImportOutcome {
    pub(crate) created: Vec<CreatedStudentRef>,
    pub(crate) errors: Vec<ImportRowFailure>,
}

/// Row data after coercion, before uniqueness and persistence.
#[derive(Debug)]
struct ValidatedRow {
    registration_number: String,
    full_name: String,
    email: String,
    department_raw: Option<String>,
    class_year: ClassYear,
    current_semester: i32,
    gender: Gender,
    mobile_no: Option<String>,
    parent_no: Option<String>,
    address: Option<String>,
    external_id: Option<String>,
}

/// What the planner decided for one row: the coerced row ready to insert
/// into `department`, or the reason it was skipped.
#[derive(Debug)]
struct PlannedRow {
    row: usize,
    identifier: String,
    outcome: Result<(ValidatedRow, Department), String>,
}

/// Ingest a batch of student rows with partial-failure semantics: each row
/// is validated and persisted independently, and a failed row is reported
/// without aborting the rest. Planning (field coercion, department
/// resolution, in-batch duplicate detection) is pure; only the
/// database-uniqueness check and the insert itself touch the pool.
pub(crate) async fn import_batch(
    pool: &PgPool,
    principal: &Principal,
    rows: Vec<ImportRow>,
    max_rows: u64,
) -> Result<ImportOutcome, ImportError> {
    let gate = ResourceRef {
        kind: ResourceKind::Student,
        department: principal.department,
        owner_id: String::new(),
    };
    if let access_policy::Decision::Deny(reason) =
        access_policy::authorize(principal, Action::Create, &gate)
    {
        return Err(ImportError::Forbidden(reason));
    }

    if rows.len() as u64 > max_rows {
        return Err(ImportError::BatchTooLarge(max_rows));
    }

    let mut outcome = ImportOutcome::default();

    for plan in plan_batch(principal, &rows) {
        let (validated, department) = match plan.outcome {
            Ok(parts) => parts,
            Err(reason) => {
                record_row_failure(&mut outcome, plan.row, plan.identifier, reason);
                continue;
            }
        };

        let conflict = repositories::students::find_key_conflict(
            pool,
            &validated.email,
            &validated.registration_number,
            validated.external_id.as_deref(),
        )
        .await?;
        if let Some(conflict) = conflict {
            record_row_failure(
                &mut outcome,
                plan.row,
                plan.identifier,
                conflict.describe().to_string(),
            );
            continue;
        }

        // Imported accounts start with their registration number as the
        // password and are forced through the change-password flow.
        let hashed_password = security::hash_password(&validated.registration_number)
            .map_err(|_| ImportError::Hashing)?;
        let now = primitive_now_utc();

        let created = repositories::students::create(
            pool,
            repositories::students::CreateStudent {
                id: &Uuid::new_v4().to_string(),
                registration_number: &validated.registration_number,
                full_name: &validated.full_name,
                email: &validated.email,
                hashed_password,
                department,
                class_year: validated.class_year,
                current_semester: validated.current_semester,
                gender: validated.gender,
                mobile_no: validated.mobile_no,
                parent_no: validated.parent_no,
                address: validated.address,
                is_first_login: true,
                created_at: now,
                updated_at: now,
            },
        )
        .await?;

        metrics::counter!("student_import_rows_total", "result" => "created").increment(1);
        outcome.created.push(CreatedStudentRef {
            id: created.id,
            registration_number: created.registration_number,
        });
    }

    tracing::info!(
        actor_id = %principal.id,
        created = outcome.created.len(),
        failed = outcome.errors.len(),
        action = "student_import",
        "Processed student import batch"
    );

    Ok(outcome)
}

/// Pure half of the import pipeline. Rows are planned in order so a
/// duplicate key inside the batch is charged to the later row; the earlier
/// occurrence keeps its claim even if it later collides with an existing
/// record, since both rows describe the same key either way.
fn plan_batch(principal: &Principal, rows: &[ImportRow]) -> Vec<PlannedRow> {
    let mut seen_emails: HashSet<String> = HashSet::new();
    let mut seen_registrations: HashSet<String> = HashSet::new();

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let row_number = index + 1;
            PlannedRow {
                row: row_number,
                identifier: row_identifier(row, row_number),
                outcome: plan_row(principal, row, &mut seen_emails, &mut seen_registrations),
            }
        })
        .collect()
}

fn plan_row(
    principal: &Principal,
    row: &ImportRow,
    seen_emails: &mut HashSet<String>,
    seen_registrations: &mut HashSet<String>,
) -> Result<(ValidatedRow, Department), String> {
    let validated = validate_row(row)?;
    let department = resolve_department(principal, validated.department_raw.as_deref())?;

    let email_key = validated.email.to_ascii_lowercase();
    if seen_emails.contains(&email_key) {
        return Err("duplicate email within this batch".to_string());
    }
    if seen_registrations.contains(&validated.registration_number) {
        return Err("duplicate registration number within this batch".to_string());
    }
    seen_emails.insert(email_key);
    seen_registrations.insert(validated.registration_number.clone());

    Ok((validated, department))
}

fn record_row_failure(
    outcome: &mut ImportOutcome,
    row_number: usize,
    identifier: String,
    reason: String,
) {
    metrics::counter!("student_import_rows_total", "result" => "failed").increment(1);
    outcome.errors.push(ImportRowFailure { row: row_number, identifier, reason });
}

fn row_identifier(row: &ImportRow, row_number: usize) -> String {
    let registration = row.registration_number.trim();
    if !registration.is_empty() {
        return registration.to_string();
    }
    let email = row.email.trim();
    if !email.is_empty() {
        return email.to_string();
    }
    format!("row {row_number}")
}

/// Checks run in a fixed order and stop at the first failure, so each error
/// entry carries exactly one reason.
fn validate_row(row: &ImportRow) -> Result<ValidatedRow, String> {
    let registration_number = required(&row.registration_number, "registration_number")?;
    let full_name = required(&row.full_name, "full_name")?;
    let email = required(&row.email, "email")?;
    let class_raw = required(&row.class_year, "class")?;
    let gender_raw = required(&row.gender, "gender")?;

    if !email.contains('@') {
        return Err("email is not a valid address".to_string());
    }

    let mobile_no = optional_phone(&row.mobile_no, "Mobile_No")?;
    let parent_no = optional_phone(&row.parent_no, "Parent_No")?;

    let gender = Gender::parse(&gender_raw)
        .ok_or_else(|| format!("gender '{gender_raw}' must be Male, Female or Other"))?;

    let class_year =
        ClassYear::parse(&class_raw).ok_or_else(|| format!("class '{class_raw}' is not one of FY, SY, TY, BE"))?;

    let current_semester = parse_semester(&row.current_semester)?;

    let department_raw = {
        let trimmed = row.department.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    };

    let address = {
        let trimmed = row.address.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    };

    let external_id = {
        let trimmed = row.external_id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    };

    Ok(ValidatedRow {
        registration_number,
        full_name,
        email,
        department_raw,
        class_year,
        current_semester,
        gender,
        mobile_no,
        parent_no,
        address,
        external_id,
    })
}

fn required(value: &str, field: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("{field} is required"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn optional_phone(value: &str, field: &str) -> Result<Option<String>, String> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    phone::normalize(value)
        .map(Some)
        .ok_or_else(|| format!("{field} must normalize to exactly 10 digits"))
}

fn parse_semester(value: &serde_json::Value) -> Result<i32, String> {
    let parsed = match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };

    let Some(parsed) = parsed else {
        return Err("current_semester is required".to_string());
    };

    if parsed.fract() != 0.0 {
        return Err(format!("current_semester '{parsed}' must be a whole number"));
    }

    let semester = parsed as i32;
    if !(1..=8).contains(&semester) {
        return Err(format!("current_semester {semester} must be between 1 and 8"));
    }
    Ok(semester)
}

/// A department admin always imports into its own department, whatever the
/// row says. A super admin may pick per row.
fn resolve_department(
    principal: &Principal,
    row_value: Option<&str>,
) -> Result<Department, String> {
    match principal.role {
        PortalRole::DepartmentAdmin => {
            principal.department.ok_or_else(|| "acting admin has no department".to_string())
        }
        PortalRole::SuperAdmin => match row_value {
            Some(raw) => Department::parse(raw)
                .ok_or_else(|| format!("department '{raw}' is not one of CSE, ENTC, MECH, CIVIL, ELE")),
            None => principal
                .department
                .ok_or_else(|| "department is required".to_string()),
        },
        PortalRole::Teacher | PortalRole::Student => Err("no applicable rule".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_row() -> ImportRow {
        ImportRow {
            registration_number: "CSE2023001".to_string(),
            full_name: "Asha Kulkarni".to_string(),
            email: "asha@college.edu".to_string(),
            department: "CSE".to_string(),
            class_year: "SY".to_string(),
            current_semester: serde_json::json!(3),
            gender: "Female".to_string(),
            mobile_no: "9876543210".to_string(),
            parent_no: "9.87654321E+9".to_string(),
            address: "12 College Road".to_string(),
            external_id: String::new(),
        }
    }

    fn row(registration_number: &str, email: &str) -> ImportRow {
        let mut row = base_row();
        row.registration_number = registration_number.to_string();
        row.email = email.to_string();
        row
    }

    fn super_admin() -> Principal {
        Principal { id: "admin-1".to_string(), role: PortalRole::SuperAdmin, department: None }
    }

    fn department_admin(department: Department) -> Principal {
        Principal {
            id: "admin-2".to_string(),
            role: PortalRole::DepartmentAdmin,
            department: Some(department),
        }
    }

    #[test]
    fn valid_row_passes_with_normalized_phones() {
        let validated = validate_row(&base_row()).expect("valid row");
        assert_eq!(validated.registration_number, "CSE2023001");
        assert_eq!(validated.mobile_no.as_deref(), Some("9876543210"));
        assert_eq!(validated.parent_no.as_deref(), Some("9876543210"));
        assert_eq!(validated.current_semester, 3);
        assert_eq!(validated.gender, Gender::Female);
        assert_eq!(validated.class_year, ClassYear::Sy);
    }

    #[test]
    fn missing_required_field_fails_first() {
        let mut row = base_row();
        row.full_name = "  ".to_string();
        row.gender = "invalid".to_string();
        // Presence check runs before the gender check.
        assert_eq!(validate_row(&row).unwrap_err(), "full_name is required");
    }

    #[test]
    fn invalid_gender_is_reported() {
        let mut row = base_row();
        row.gender = "N/A".to_string();
        let err = validate_row(&row).unwrap_err();
        assert!(err.contains("gender"), "unexpected error: {err}");
    }

    #[test]
    fn bad_phone_is_reported_with_field_name() {
        let mut row = base_row();
        row.parent_no = "12345".to_string();
        let err = validate_row(&row).unwrap_err();
        assert!(err.starts_with("Parent_No"), "unexpected error: {err}");
    }

    #[test]
    fn semester_accepts_spreadsheet_string_numbers() {
        let mut row = base_row();
        row.current_semester = serde_json::json!("4");
        assert_eq!(validate_row(&row).expect("valid").current_semester, 4);

        row.current_semester = serde_json::json!("4.5");
        assert!(validate_row(&row).is_err());

        row.current_semester = serde_json::json!(9);
        assert!(validate_row(&row).is_err());

        row.current_semester = serde_json::Value::Null;
        assert!(validate_row(&row).is_err());
    }

    #[test]
    fn department_admin_import_forces_own_department() {
        let admin = department_admin(Department::Mech);
        // A conflicting row value is ignored, not an error.
        assert_eq!(resolve_department(&admin, Some("CSE")), Ok(Department::Mech));
        assert_eq!(resolve_department(&admin, None), Ok(Department::Mech));
    }

    #[test]
    fn super_admin_import_uses_row_value_or_fallback() {
        let admin = super_admin();
        assert_eq!(resolve_department(&admin, Some("civil")), Ok(Department::Civil));
        assert!(resolve_department(&admin, Some("EEE")).is_err());
        assert!(resolve_department(&admin, None).is_err());
    }

    #[test]
    fn one_bad_row_does_not_sink_the_batch() {
        let mut second = row("CSE2023002", "rohan@college.edu");
        second.gender = "N/A".to_string();
        let rows = vec![
            row("CSE2023001", "asha@college.edu"),
            second,
            row("CSE2023003", "meera@college.edu"),
        ];

        let plans = plan_batch(&super_admin(), &rows);
        assert_eq!(plans.len(), 3);
        assert_eq!(plans.iter().filter(|plan| plan.outcome.is_ok()).count(), 2);

        let failed: Vec<&PlannedRow> =
            plans.iter().filter(|plan| plan.outcome.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].row, 2);
        assert_eq!(failed[0].identifier, "CSE2023002");
        let reason = failed[0].outcome.as_ref().unwrap_err();
        assert!(reason.contains("gender"), "unexpected reason: {reason}");
    }

    #[test]
    fn duplicate_keys_within_one_batch_are_caught() {
        let rows = vec![
            row("CSE2023001", "asha@college.edu"),
            // Same email as row 1 up to case, fresh registration number.
            row("CSE2023002", "ASHA@college.edu"),
            // Same registration number as row 1, fresh email.
            row("CSE2023001", "meera@college.edu"),
        ];

        let plans = plan_batch(&department_admin(Department::Cse), &rows);
        assert!(plans[0].outcome.is_ok());
        assert_eq!(
            plans[1].outcome.as_ref().unwrap_err(),
            "duplicate email within this batch"
        );
        assert_eq!(
            plans[2].outcome.as_ref().unwrap_err(),
            "duplicate registration number within this batch"
        );
        assert_eq!(plans[2].identifier, "CSE2023001");
    }

    #[test]
    fn row_identifier_prefers_registration_number() {
        let row = base_row();
        assert_eq!(row_identifier(&row, 7), "CSE2023001");

        let mut anonymous = base_row();
        anonymous.registration_number = String::new();
        assert_eq!(row_identifier(&anonymous, 7), "asha@college.edu");

        anonymous.email = String::new();
        assert_eq!(row_identifier(&anonymous, 7), "row 7");
    }
}
