pub(crate) mod academics;
pub(crate) mod access_policy;
pub(crate) mod phone;
pub(crate) mod record_update;
pub(crate) mod student_import;
