use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::pagination::default_limit;
use crate::core::time::format_primitive;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserCreate {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, max = 200, message = "full_name must not be empty"))]
    pub(crate) full_name: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLogin {
    pub(crate) email: String,
    pub(crate) password: String,
}

/// Self-service profile changes. Role flags are admin-only.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserUpdate {
    #[serde(default)]
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, max = 200, message = "full_name must not be empty"))]
    pub(crate) full_name: Option<String>,
    #[serde(default)]
    pub(crate) password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdminUserUpdate {
    #[serde(default)]
    #[serde(alias = "isAdmin")]
    pub(crate) is_admin: Option<bool>,
    #[serde(default)]
    #[serde(alias = "isEducator")]
    pub(crate) is_educator: Option<bool>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdminUserListQuery {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) is_admin: Option<bool>,
    #[serde(default)]
    pub(crate) is_educator: Option<bool>,
    #[serde(default)]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: i64,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) is_admin: bool,
    pub(crate) is_educator: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: crate::db::models::User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_admin: user.is_admin,
            is_educator: user.is_educator,
            is_active: user.is_active,
            created_at: format_primitive(user.created_at),
        }
    }
}
