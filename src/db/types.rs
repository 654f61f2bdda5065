use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Academic unit scoping every non-super-admin actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "department", rename_all = "UPPERCASE")]
pub(crate) enum Department {
    Cse,
    Entc,
    Mech,
    Civil,
    Ele,
}

impl Department {
    pub(crate) const ALL: [Department; 5] = [
        Department::Cse,
        Department::Entc,
        Department::Mech,
        Department::Civil,
        Department::Ele,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Department::Cse => "CSE",
            Department::Entc => "ENTC",
            Department::Mech => "MECH",
            Department::Civil => "CIVIL",
            Department::Ele => "ELE",
        }
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ALL.iter().copied().find(|code| code.as_str() == normalized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "classyear", rename_all = "UPPERCASE")]
pub(crate) enum ClassYear {
    Fy,
    Sy,
    Ty,
    Be,
}

impl ClassYear {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "FY" => Some(ClassYear::Fy),
            "SY" => Some(ClassYear::Sy),
            "TY" => Some(ClassYear::Ty),
            "BE" => Some(ClassYear::Be),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "gender")]
pub(crate) enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "adminrole", rename_all = "snake_case")]
pub(crate) enum AdminRole {
    SuperAdmin,
    DepartmentAdmin,
}

/// Role of an authenticated actor anywhere in the portal. Carried in the
/// session token so guards know which account table the subject id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PortalRole {
    Student,
    Teacher,
    DepartmentAdmin,
    SuperAdmin,
}

impl From<AdminRole> for PortalRole {
    fn from(role: AdminRole) -> Self {
        match role {
            AdminRole::SuperAdmin => PortalRole::SuperAdmin,
            AdminRole::DepartmentAdmin => PortalRole::DepartmentAdmin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_parse_accepts_any_case() {
        assert_eq!(Department::parse("cse"), Some(Department::Cse));
        assert_eq!(Department::parse(" ENTC "), Some(Department::Entc));
        assert_eq!(Department::parse("EEE"), None);
    }

    #[test]
    fn gender_parse_is_case_insensitive() {
        assert_eq!(Gender::parse("Male"), Some(Gender::Male));
        assert_eq!(Gender::parse("FEMALE"), Some(Gender::Female));
        assert_eq!(Gender::parse("unknown"), None);
    }

    #[test]
    fn department_serializes_as_code() {
        let json = serde_json::to_string(&Department::Mech).unwrap();
        assert_eq!(json, "\"MECH\"");
    }
}
