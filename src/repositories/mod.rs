pub(crate) mod admins;
pub(crate) mod students;
pub(crate) mod teachers;
