use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::{check_max_length, present, required_text, RawField};
use crate::error::FieldErrors;

pub const ROLE_NAME_MAX_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

/// Join record; a user holds a role once per row.
#[derive(Debug, Clone, FromRow)]
pub struct UserRole {
    pub id: i64,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateRoleRequest {
    #[serde(default, deserialize_with = "present")]
    pub name: RawField,
}

impl CreateRoleRequest {
    /// Returns the trimmed role name.
    pub fn validate(self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let Some(name) = required_text(&mut errors, "name", self.name) else {
            return Err(errors);
        };
        check_max_length(&mut errors, "name", &name, ROLE_NAME_MAX_LENGTH);
        errors.into_result(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
        }
    }
}

/// Ids are kept as raw JSON so that absent, mistyped and malformed values
/// all resolve to "not found" rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct AssignRoleRequest {
    #[serde(default)]
    pub user_id: Value,
    #[serde(default)]
    pub role_id: Value,
}

impl AssignRoleRequest {
    pub fn user_id(&self) -> Option<Uuid> {
        parse_id(&self.user_id)
    }

    pub fn role_id(&self) -> Option<Uuid> {
        parse_id(&self.role_id)
    }
}

fn parse_id(value: &Value) -> Option<Uuid> {
    value.as_str().and_then(|s| Uuid::parse_str(s.trim()).ok())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
