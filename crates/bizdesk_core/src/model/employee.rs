//! Employee records.
//!
//! Employees are staff who manage or contribute to projects. A `User` may be
//! linked to one employee, which is what row-scoped access keys on.

use super::{
    normalize_email, normalize_optional, nullable, now_epoch_ms, optional_text, require_email,
    require_text, wire_enum, RecordId, ValidationError, NAME_MAX_CHARS,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

wire_enum! {
    pub enum EmployeeStatus {
        Active => "active",
        OnLeave => "on_leave",
        Terminated => "terminated",
    }
}

impl Default for EmployeeStatus {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub status: EmployeeStatus,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: EmployeeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EmployeePatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub position: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub department: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub hire_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub status: Option<EmployeeStatus>,
}

impl Employee {
    pub fn from_new(input: NewEmployee) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: normalize_email(&input.email),
            position: normalize_optional(input.position),
            department: normalize_optional(input.department),
            hire_date: input.hire_date,
            status: input.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, patch: EmployeePatch) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = normalize_email(&email);
        }
        if let Some(position) = patch.position {
            self.position = normalize_optional(position);
        }
        if let Some(department) = patch.department {
            self.department = normalize_optional(department);
        }
        if let Some(hire_date) = patch.hire_date {
            self.hire_date = hire_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("first_name", &self.first_name, NAME_MAX_CHARS)?;
        require_text("last_name", &self.last_name, NAME_MAX_CHARS)?;
        require_email("email", &self.email)?;
        optional_text("position", self.position.as_deref(), NAME_MAX_CHARS)?;
        optional_text("department", self.department.as_deref(), NAME_MAX_CHARS)?;
        Ok(())
    }

    /// Display name as `First Last`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
