use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::{Department, PortalRole};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LoginRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: &'static str,
    pub(crate) principal: PrincipalResponse,
}

/// Who the caller is, as every authenticated surface reports it.
#[derive(Debug, Serialize)]
pub(crate) struct PrincipalResponse {
    pub(crate) id: String,
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) role: PortalRole,
    pub(crate) department: Option<Department>,
    pub(crate) is_first_login: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ChangePasswordRequest {
    #[serde(alias = "currentPassword")]
    #[validate(length(min = 1, message = "current_password must not be empty"))]
    pub(crate) current_password: String,
    #[serde(alias = "newPassword")]
    #[validate(length(min = 8, message = "new_password must be at least 8 characters"))]
    pub(crate) new_password: String,
}
