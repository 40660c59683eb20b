//! Application users and their roles.
//!
//! # Invariants
//! - `email` is unique (case-insensitive) and stored lowercase.
//! - `employee_id`, when set, links the user to exactly one employee record.

use super::{
    normalize_email, now_epoch_ms, require_email, require_text, wire_enum, RecordId,
    ValidationError, NAME_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

wire_enum! {
    /// Access role granted to a user.
    pub enum Role {
        /// Full access, including users and the audit log.
        Admin => "admin",
        /// Full access to business records.
        Manager => "manager",
        /// Row-scoped access to the projects the user works on.
        Employee => "employee",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub employee_id: Option<RecordId>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(default)]
    pub employee_id: Option<RecordId>,
}

impl User {
    pub fn from_new(input: NewUser) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(&input.email),
            display_name: input.display_name.trim().to_string(),
            role: input.role,
            employee_id: input.employee_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_email("email", &self.email)?;
        require_text("display_name", &self.display_name, NAME_MAX_CHARS)?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
