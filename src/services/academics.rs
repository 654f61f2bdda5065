use serde::Serialize;

use crate::db::models::StudentRecord;

/// Derived metrics every student view depends on. Analytics, not
/// transactional data: malformed history degrades to zero, never errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct Summary {
    pub(crate) current_cgpa: f64,
    pub(crate) current_sgpa: f64,
    pub(crate) overall_attendance: f64,
    pub(crate) current_semester_attendance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct DepartmentPerformance {
    pub(crate) attendance: f64,
    pub(crate) result: f64,
    pub(crate) achievements: u64,
    pub(crate) students: u64,
    pub(crate) cgpa9plus_count: u64,
    pub(crate) cgpa9plus_pct: f64,
}

pub(crate) fn summarize(record: &StudentRecord) -> Summary {
    let current_cgpa = record.previous_cgpa.last().copied().unwrap_or(0.0);

    let overall_attendance = if record.attendance.is_empty() {
        0.0
    } else {
        let total: f64 = record.attendance.iter().map(|entry| entry.average_attendance).sum();
        round2(total / record.attendance.len() as f64)
    };

    let current_semester_attendance = record
        .attendance
        .iter()
        .find(|entry| entry.semester == record.current_semester)
        .map(|entry| entry.average_attendance)
        .unwrap_or(0.0);

    Summary {
        current_cgpa,
        // SGPA is read from the same stored array as CGPA everywhere in the
        // portal; whether it deserves its own source field is an open product
        // question, so the shared derivation lives in exactly one place.
        current_sgpa: current_cgpa,
        overall_attendance,
        current_semester_attendance,
    }
}

pub(crate) fn department_performance(records: &[StudentRecord]) -> DepartmentPerformance {
    let students = records.len() as u64;
    if records.is_empty() {
        return DepartmentPerformance {
            attendance: 0.0,
            result: 0.0,
            achievements: 0,
            students: 0,
            cgpa9plus_count: 0,
            cgpa9plus_pct: 0.0,
        };
    }

    let summaries: Vec<Summary> = records.iter().map(summarize).collect();

    let attendance =
        round2(summaries.iter().map(|s| s.overall_attendance).sum::<f64>() / students as f64);

    // Mean CGPA rescaled to the 0-100 axis the dashboard radar uses.
    let mean_cgpa = summaries.iter().map(|s| s.current_cgpa).sum::<f64>() / students as f64;
    let result = round2(mean_cgpa / 10.0 * 100.0);

    let achievements = records.iter().map(|r| r.achievements.len() as u64).sum();

    let cgpa9plus_count = summaries.iter().filter(|s| s.current_cgpa >= 9.0).count() as u64;
    let cgpa9plus_pct = round2(cgpa9plus_count as f64 / students as f64 * 100.0);

    DepartmentPerformance {
        attendance,
        result,
        achievements,
        students,
        cgpa9plus_count,
        cgpa9plus_pct,
    }
}

/// Two-decimal rounding, half away from zero, matching the presentation
/// layer's `toFixed(2)` expectations.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use sqlx::types::Json;
    use time::macros::datetime;

    use super::*;
    use crate::db::models::AttendanceEntry;
    use crate::db::types::{ClassYear, Department, Gender};

    fn student(semester: i32, cgpa: Vec<f64>, attendance: Vec<AttendanceEntry>) -> StudentRecord {
        let created = datetime!(2025-06-01 09:00:00);
        StudentRecord {
            id: "s-1".to_string(),
            registration_number: "REG001".to_string(),
            full_name: "Asha Kulkarni".to_string(),
            email: "asha@college.edu".to_string(),
            hashed_password: "hash".to_string(),
            department: Department::Cse,
            class_year: ClassYear::Ty,
            current_semester: semester,
            class_rank: 0,
            previous_cgpa: Json(cgpa.clone()),
            previous_percentages: Json(cgpa.iter().map(|c| c * 9.5).collect()),
            attendance: Json(attendance),
            semester_progress: Json(Vec::new()),
            achievements: Json(Vec::new()),
            mobile_no: None,
            parent_no: None,
            address: None,
            gender: Gender::Female,
            photo_url: None,
            is_first_login: false,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn current_cgpa_is_last_history_entry() {
        let record = student(4, vec![7.0, 8.2, 9.1], Vec::new());
        let summary = summarize(&record);
        assert_eq!(summary.current_cgpa, 9.1);
        assert_eq!(summary.current_sgpa, 9.1);
    }

    #[test]
    fn empty_history_defaults_to_zero() {
        let record = student(1, Vec::new(), Vec::new());
        let summary = summarize(&record);
        assert_eq!(summary.current_cgpa, 0.0);
        assert_eq!(summary.overall_attendance, 0.0);
        assert_eq!(summary.current_semester_attendance, 0.0);
    }

    #[test]
    fn overall_attendance_is_two_decimal_mean() {
        let record = student(
            3,
            vec![8.0, 8.0],
            vec![
                AttendanceEntry { semester: 1, average_attendance: 80.0 },
                AttendanceEntry { semester: 2, average_attendance: 90.0 },
            ],
        );
        assert_eq!(summarize(&record).overall_attendance, 85.0);

        let uneven = student(
            4,
            Vec::new(),
            vec![
                AttendanceEntry { semester: 1, average_attendance: 70.0 },
                AttendanceEntry { semester: 2, average_attendance: 80.0 },
                AttendanceEntry { semester: 3, average_attendance: 81.0 },
            ],
        );
        assert_eq!(summarize(&uneven).overall_attendance, 77.0);
    }

    #[test]
    fn current_semester_attendance_matches_semester() {
        let record = student(
            2,
            Vec::new(),
            vec![
                AttendanceEntry { semester: 1, average_attendance: 75.0 },
                AttendanceEntry { semester: 2, average_attendance: 88.5 },
            ],
        );
        assert_eq!(summarize(&record).current_semester_attendance, 88.5);

        let no_current = student(
            5,
            Vec::new(),
            vec![AttendanceEntry { semester: 1, average_attendance: 75.0 }],
        );
        assert_eq!(summarize(&no_current).current_semester_attendance, 0.0);
    }

    #[test]
    fn department_performance_over_mixed_cohort() {
        let mut high = student(
            4,
            vec![8.0, 8.5, 9.2],
            vec![AttendanceEntry { semester: 1, average_attendance: 90.0 }],
        );
        high.achievements = Json(vec!["Hackathon winner".to_string()]);
        let low = student(
            4,
            vec![6.0, 6.5, 7.0],
            vec![AttendanceEntry { semester: 1, average_attendance: 70.0 }],
        );

        let perf = department_performance(&[high, low]);
        assert_eq!(perf.students, 2);
        assert_eq!(perf.attendance, 80.0);
        // mean cgpa (9.2 + 7.0) / 2 = 8.1 -> 81.0 on the 0-100 axis
        assert_eq!(perf.result, 81.0);
        assert_eq!(perf.achievements, 1);
        assert_eq!(perf.cgpa9plus_count, 1);
        assert_eq!(perf.cgpa9plus_pct, 50.0);
    }

    #[test]
    fn department_performance_of_empty_cohort_is_zeroed() {
        let perf = department_performance(&[]);
        assert_eq!(perf.students, 0);
        assert_eq!(perf.attendance, 0.0);
        assert_eq!(perf.result, 0.0);
        assert_eq!(perf.cgpa9plus_pct, 0.0);
    }

    #[test]
    fn round2_is_half_away_from_zero() {
        assert_eq!(round2(77.006), 77.01);
        assert_eq!(round2(77.004), 77.0);
        // .5 at the second decimal rounds away from zero, not to even
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(0.125), 0.13);
    }
}
