use thiserror::Error;

use crate::db::models::StudentRecord;
use crate::schemas::student::StudentPatch;

pub(crate) const MIN_SEMESTER: i32 = 1;
pub(crate) const MAX_SEMESTER: i32 = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum UpdateError {
    #[error("current_semester must be between {MIN_SEMESTER} and {MAX_SEMESTER}")]
    InvalidSemester,
    #[error("duplicate attendance entry for semester {0}")]
    DuplicateSemester(i32),
    #[error("{0}")]
    Validation(String),
}

/// Apply an allow-listed patch to a student record in memory.
///
/// Ordering matters: replacement history arrays land first, then a semester
/// change resizes them, then attendance entries are checked against the
/// post-update semester. On success both history arrays hold exactly
/// `current_semester - 1` entries and every attendance entry references a
/// completed semester. The record is untouched when an error is returned.
pub(crate) fn apply_student_patch(
    record: &mut StudentRecord,
    patch: StudentPatch,
) -> Result<(), UpdateError> {
    let new_semester = match patch.current_semester {
        Some(semester) if !(MIN_SEMESTER..=MAX_SEMESTER).contains(&semester) => {
            return Err(UpdateError::InvalidSemester);
        }
        Some(semester) => semester,
        None => record.current_semester,
    };

    if let Some(rank) = patch.class_rank {
        if rank < 0 {
            return Err(UpdateError::Validation("class_rank must be non-negative".to_string()));
        }
    }

    if let Some(entries) = patch.attendance.as_deref() {
        validate_attendance(entries, new_semester)?;
    }

    // All checks passed; mutate.
    if let Some(value) = patch.mobile_no {
        record.mobile_no = Some(value);
    }
    if let Some(value) = patch.parent_no {
        record.parent_no = Some(value);
    }
    if let Some(value) = patch.address {
        record.address = Some(value);
    }
    if let Some(value) = patch.photo_url {
        record.photo_url = Some(value);
    }
    if let Some(rank) = patch.class_rank {
        record.class_rank = rank;
    }
    if let Some(values) = patch.previous_cgpa {
        record.previous_cgpa.0 = values;
    }
    if let Some(values) = patch.previous_percentages {
        record.previous_percentages.0 = values;
    }
    if let Some(values) = patch.achievements {
        record.achievements.0 = values;
    }
    if let Some(values) = patch.semester_progress {
        record.semester_progress.0 = values;
    }
    if let Some(entries) = patch.attendance {
        record.attendance.0 = entries;
    }

    if new_semester != record.current_semester {
        record.current_semester = new_semester;
        // Regressing the semester may strand attendance entries for
        // semesters that are no longer completed; drop them.
        record.attendance.0.retain(|entry| entry.semester < new_semester);
    }

    let completed = (record.current_semester - 1) as usize;
    resize_history(&mut record.previous_cgpa.0, completed);
    resize_history(&mut record.previous_percentages.0, completed);

    Ok(())
}

/// Pad with neutral zeros when the semester advanced, truncate on regression.
fn resize_history(history: &mut Vec<f64>, completed: usize) {
    if history.len() > completed {
        history.truncate(completed);
    } else {
        history.resize(completed, 0.0);
    }
}

fn validate_attendance(entries: &[crate::db::models::AttendanceEntry], current_semester: i32) -> Result<(), UpdateError> {
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        if !(0.0..=100.0).contains(&entry.average_attendance) {
            return Err(UpdateError::Validation(format!(
                "average_attendance for semester {} must be within 0..100",
                entry.semester
            )));
        }
        if entry.semester < MIN_SEMESTER || entry.semester >= current_semester {
            return Err(UpdateError::Validation(format!(
                "attendance semester {} must be a completed semester (before {})",
                entry.semester, current_semester
            )));
        }
        if !seen.insert(entry.semester) {
            return Err(UpdateError::DuplicateSemester(entry.semester));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::types::Json;
    use time::macros::datetime;

    use super::*;
    use crate::db::models::AttendanceEntry;
    use crate::db::types::{ClassYear, Department, Gender};

    fn record(semester: i32, cgpa: Vec<f64>) -> StudentRecord {
        let created = datetime!(2025-06-01 09:00:00);
        let percentages = cgpa.iter().map(|c| c * 9.0).collect();
        StudentRecord {
            id: "s-1".to_string(),
            registration_number: "REG001".to_string(),
            full_name: "Rohan Patil".to_string(),
            email: "rohan@college.edu".to_string(),
            hashed_password: "hash".to_string(),
            department: Department::Mech,
            class_year: ClassYear::Sy,
            current_semester: semester,
            class_rank: 5,
            previous_cgpa: Json(cgpa),
            previous_percentages: Json(percentages),
            attendance: Json(Vec::new()),
            semester_progress: Json(Vec::new()),
            achievements: Json(Vec::new()),
            mobile_no: None,
            parent_no: None,
            address: None,
            gender: Gender::Male,
            photo_url: None,
            is_first_login: false,
            created_at: created,
            updated_at: created,
        }
    }

    fn patch_json(value: serde_json::Value) -> StudentPatch {
        serde_json::from_value(value).expect("patch")
    }

    #[test]
    fn semester_advance_pads_history_with_zeros() {
        let mut student = record(3, vec![7.0, 8.0]);
        apply_student_patch(&mut student, patch_json(serde_json::json!({
            "current_semester": 5
        })))
        .expect("patch applies");

        assert_eq!(student.current_semester, 5);
        assert_eq!(student.previous_cgpa.0, vec![7.0, 8.0, 0.0, 0.0]);
        assert_eq!(student.previous_percentages.0.len(), 4);
    }

    #[test]
    fn semester_regression_truncates_history_and_attendance() {
        let mut student = record(5, vec![7.0, 8.0, 8.5, 9.0]);
        student.attendance.0 = vec![
            AttendanceEntry { semester: 1, average_attendance: 80.0 },
            AttendanceEntry { semester: 4, average_attendance: 85.0 },
        ];

        apply_student_patch(&mut student, patch_json(serde_json::json!({
            "current_semester": 3
        })))
        .expect("patch applies");

        assert_eq!(student.previous_cgpa.0, vec![7.0, 8.0]);
        assert_eq!(student.previous_percentages.0.len(), 2);
        assert_eq!(student.attendance.0.len(), 1);
        assert_eq!(student.attendance.0[0].semester, 1);
    }

    #[test]
    fn semester_outside_range_is_rejected() {
        let mut student = record(3, vec![7.0, 8.0]);
        let before = student.clone();

        let err = apply_student_patch(&mut student, patch_json(serde_json::json!({
            "current_semester": 9
        })))
        .unwrap_err();
        assert_eq!(err, UpdateError::InvalidSemester);
        assert_eq!(student.previous_cgpa.0, before.previous_cgpa.0);

        let err = apply_student_patch(&mut student, patch_json(serde_json::json!({
            "current_semester": 0
        })))
        .unwrap_err();
        assert_eq!(err, UpdateError::InvalidSemester);
    }

    #[test]
    fn history_lengths_stay_consistent_after_any_successful_patch() {
        let mut student = record(4, vec![7.0, 8.0, 8.2]);
        apply_student_patch(&mut student, patch_json(serde_json::json!({
            "previous_cgpa": [7.0],
            "previous_percentages": [70.0, 72.0, 74.0, 76.0, 78.0]
        })))
        .expect("patch applies");

        let completed = (student.current_semester - 1) as usize;
        assert_eq!(student.previous_cgpa.0.len(), completed);
        assert_eq!(student.previous_percentages.0.len(), completed);
        assert_eq!(student.previous_cgpa.0, vec![7.0, 0.0, 0.0]);
        assert_eq!(student.previous_percentages.0, vec![70.0, 72.0, 74.0]);
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let mut student = record(4, vec![7.0, 8.0, 8.2]);
        let before = student.clone();

        apply_student_patch(&mut student, StudentPatch::default()).expect("first");
        apply_student_patch(&mut student, StudentPatch::default()).expect("second");

        assert_eq!(student.current_semester, before.current_semester);
        assert_eq!(student.previous_cgpa.0, before.previous_cgpa.0);
        assert_eq!(student.class_rank, before.class_rank);
    }

    #[test]
    fn attendance_entries_are_validated_against_new_semester() {
        let mut student = record(3, vec![7.0, 8.0]);

        // Entry for a not-yet-completed semester.
        let err = apply_student_patch(&mut student, patch_json(serde_json::json!({
            "attendance": [{"semester": 3, "average_attendance": 90.0}]
        })))
        .unwrap_err();
        assert!(matches!(err, UpdateError::Validation(_)));

        // Same entry becomes valid once the semester advances in the same patch.
        apply_student_patch(&mut student, patch_json(serde_json::json!({
            "current_semester": 4,
            "attendance": [{"semester": 3, "average_attendance": 90.0}]
        })))
        .expect("patch applies");
        assert_eq!(student.attendance.0.len(), 1);
    }

    #[test]
    fn attendance_out_of_range_is_rejected() {
        let mut student = record(3, vec![7.0, 8.0]);
        let err = apply_student_patch(&mut student, patch_json(serde_json::json!({
            "attendance": [{"semester": 1, "average_attendance": 101.0}]
        })))
        .unwrap_err();
        assert!(matches!(err, UpdateError::Validation(_)));
    }

    #[test]
    fn duplicate_attendance_semesters_are_rejected() {
        let mut student = record(4, vec![7.0, 8.0, 8.5]);
        let err = apply_student_patch(&mut student, patch_json(serde_json::json!({
            "attendance": [
                {"semester": 2, "average_attendance": 80.0},
                {"semester": 2, "average_attendance": 85.0}
            ]
        })))
        .unwrap_err();
        assert_eq!(err, UpdateError::DuplicateSemester(2));
    }

    #[test]
    fn negative_class_rank_is_rejected() {
        let mut student = record(2, vec![7.0]);
        let err = apply_student_patch(&mut student, patch_json(serde_json::json!({
            "class_rank": -1
        })))
        .unwrap_err();
        assert!(matches!(err, UpdateError::Validation(_)));
    }

    #[test]
    fn contact_fields_update_in_place() {
        let mut student = record(2, vec![7.0]);
        apply_student_patch(&mut student, patch_json(serde_json::json!({
            "Mobile_No": "9876543210",
            "address": "12 College Road",
            "achievements": ["Paper published"]
        })))
        .expect("patch applies");

        assert_eq!(student.mobile_no.as_deref(), Some("9876543210"));
        assert_eq!(student.address.as_deref(), Some("12 College Road"));
        assert_eq!(student.achievements.0, vec!["Paper published".to_string()]);
    }
}
