use crate::db::types::{Department, PortalRole};

/// Authenticated actor as seen by every service. Produced by the session
/// guard; `department` is `Some` for every department-scoped role.
#[derive(Debug, Clone)]
pub(crate) struct Principal {
    pub(crate) id: String,
    pub(crate) role: PortalRole,
    pub(crate) department: Option<Department>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Read,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResourceKind {
    Student,
    Teacher,
    Admin,
}

/// Identity of the record an action targets: what it is, which department
/// owns it, and whose account it is.
#[derive(Debug, Clone)]
pub(crate) struct ResourceRef {
    pub(crate) kind: ResourceKind,
    pub(crate) department: Option<Department>,
    pub(crate) owner_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Allow,
    Deny(&'static str),
}

/// Visibility filter for list/read queries, derived once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecordScope {
    All,
    Department(Department),
    OwnRecord(String),
    Nothing,
}

impl RecordScope {
    pub(crate) fn permits(&self, department: Option<Department>, id: &str) -> bool {
        match self {
            RecordScope::All => true,
            RecordScope::Department(own) => department == Some(*own),
            RecordScope::OwnRecord(own_id) => own_id == id,
            RecordScope::Nothing => false,
        }
    }
}

/// Single authorization authority for the portal. Pure over its inputs;
/// rules are evaluated in order and the first match wins.
pub(crate) fn authorize(principal: &Principal, action: Action, resource: &ResourceRef) -> Decision {
    match principal.role {
        PortalRole::SuperAdmin => {
            if action == Action::Delete
                && resource.kind == ResourceKind::Admin
                && resource.owner_id == principal.id
            {
                return Decision::Deny("cannot delete the acting admin account");
            }
            Decision::Allow
        }
        PortalRole::DepartmentAdmin => {
            if resource.department.is_some() && resource.department == principal.department {
                Decision::Allow
            } else {
                Decision::Deny("department mismatch")
            }
        }
        PortalRole::Teacher => {
            if resource.kind == ResourceKind::Student
                && matches!(action, Action::Read | Action::Update)
            {
                return if resource.department.is_some()
                    && resource.department == principal.department
                {
                    Decision::Allow
                } else {
                    Decision::Deny("department mismatch")
                };
            }

            // A teacher's own password changes go through the dedicated
            // credential flow; staff profiles are admin territory.
            if matches!(action, Action::Create | Action::Delete) {
                return Decision::Deny("teachers cannot create or delete accounts");
            }

            Decision::Deny("no applicable rule")
        }
        PortalRole::Student => {
            // Students are read-only, and only on their own record.
            if action == Action::Read && resource.owner_id == principal.id {
                Decision::Allow
            } else {
                Decision::Deny("no applicable rule")
            }
        }
    }
}

pub(crate) fn scope(principal: &Principal, kind: ResourceKind) -> RecordScope {
    match principal.role {
        PortalRole::SuperAdmin => RecordScope::All,
        PortalRole::DepartmentAdmin | PortalRole::Teacher => match principal.department {
            Some(department) => RecordScope::Department(department),
            None => RecordScope::Nothing,
        },
        PortalRole::Student => {
            if kind == ResourceKind::Student {
                RecordScope::OwnRecord(principal.id.clone())
            } else {
                RecordScope::Nothing
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: PortalRole, department: Option<Department>) -> Principal {
        Principal { id: "actor-1".to_string(), role, department }
    }

    fn student_in(department: Department) -> ResourceRef {
        ResourceRef {
            kind: ResourceKind::Student,
            department: Some(department),
            owner_id: "student-1".to_string(),
        }
    }

    #[test]
    fn super_admin_is_unrestricted_across_departments() {
        let admin = principal(PortalRole::SuperAdmin, None);
        for action in [Action::Read, Action::Create, Action::Update, Action::Delete] {
            assert_eq!(
                authorize(&admin, action, &student_in(Department::Civil)),
                Decision::Allow
            );
        }
    }

    #[test]
    fn super_admin_cannot_delete_itself() {
        let admin = principal(PortalRole::SuperAdmin, None);
        let own_account = ResourceRef {
            kind: ResourceKind::Admin,
            department: None,
            owner_id: admin.id.clone(),
        };
        assert_eq!(
            authorize(&admin, Action::Delete, &own_account),
            Decision::Deny("cannot delete the acting admin account")
        );
        // Reading its own account stays allowed.
        assert_eq!(authorize(&admin, Action::Read, &own_account), Decision::Allow);
    }

    #[test]
    fn department_admin_is_bounded_by_department() {
        let admin = principal(PortalRole::DepartmentAdmin, Some(Department::Cse));
        assert_eq!(authorize(&admin, Action::Delete, &student_in(Department::Cse)), Decision::Allow);
        assert_eq!(
            authorize(&admin, Action::Delete, &student_in(Department::Mech)),
            Decision::Deny("department mismatch")
        );
    }

    #[test]
    fn teacher_updates_students_in_own_department_only() {
        let teacher = principal(PortalRole::Teacher, Some(Department::Entc));
        assert_eq!(
            authorize(&teacher, Action::Update, &student_in(Department::Entc)),
            Decision::Allow
        );
        assert_eq!(
            authorize(&teacher, Action::Update, &student_in(Department::Cse)),
            Decision::Deny("department mismatch")
        );
    }

    #[test]
    fn teacher_cannot_create_or_delete_accounts() {
        let teacher = principal(PortalRole::Teacher, Some(Department::Entc));
        assert_eq!(
            authorize(&teacher, Action::Create, &student_in(Department::Entc)),
            Decision::Deny("teachers cannot create or delete accounts")
        );
        assert_eq!(
            authorize(&teacher, Action::Delete, &student_in(Department::Entc)),
            Decision::Deny("teachers cannot create or delete accounts")
        );
    }

    #[test]
    fn teacher_cannot_update_staff_profiles_including_its_own() {
        let teacher = principal(PortalRole::Teacher, Some(Department::Entc));
        // Qualification and experience stay admin-managed even on the
        // teacher's own record; passwords change through the auth flow.
        let own = ResourceRef {
            kind: ResourceKind::Teacher,
            department: Some(Department::Entc),
            owner_id: teacher.id.clone(),
        };
        assert_eq!(
            authorize(&teacher, Action::Update, &own),
            Decision::Deny("no applicable rule")
        );

        let colleague = ResourceRef {
            kind: ResourceKind::Teacher,
            department: Some(Department::Entc),
            owner_id: "teacher-2".to_string(),
        };
        assert_eq!(
            authorize(&teacher, Action::Update, &colleague),
            Decision::Deny("no applicable rule")
        );
    }

    #[test]
    fn student_reads_own_record_only() {
        let student = principal(PortalRole::Student, Some(Department::Cse));
        let own = ResourceRef {
            kind: ResourceKind::Student,
            department: Some(Department::Cse),
            owner_id: student.id.clone(),
        };
        assert_eq!(authorize(&student, Action::Read, &own), Decision::Allow);
        assert_eq!(
            authorize(&student, Action::Update, &own),
            Decision::Deny("no applicable rule")
        );
        assert_eq!(
            authorize(&student, Action::Read, &student_in(Department::Cse)),
            Decision::Deny("no applicable rule")
        );
    }

    #[test]
    fn scope_filters_mixed_department_set() {
        let records = [
            (Some(Department::Cse), "s1"),
            (Some(Department::Mech), "s2"),
            (Some(Department::Cse), "s3"),
        ];

        let admin = principal(PortalRole::DepartmentAdmin, Some(Department::Cse));
        let admin_scope = scope(&admin, ResourceKind::Student);
        let visible: Vec<&str> = records
            .iter()
            .filter(|(dept, id)| admin_scope.permits(*dept, id))
            .map(|(_, id)| *id)
            .collect();
        assert_eq!(visible, vec!["s1", "s3"]);

        let root = principal(PortalRole::SuperAdmin, None);
        let root_scope = scope(&root, ResourceKind::Student);
        assert!(records.iter().all(|(dept, id)| root_scope.permits(*dept, id)));
    }

    #[test]
    fn student_scope_is_own_record() {
        let student = principal(PortalRole::Student, Some(Department::Ele));
        let own_scope = scope(&student, ResourceKind::Student);
        assert!(own_scope.permits(Some(Department::Ele), "actor-1"));
        assert!(!own_scope.permits(Some(Department::Ele), "someone-else"));
        assert_eq!(scope(&student, ResourceKind::Teacher), RecordScope::Nothing);
    }
}
