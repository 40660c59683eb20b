//! Project and project membership records.
//!
//! # Invariants
//! - A project always belongs to exactly one client.
//! - `end_date >= start_date` when both are set.
//! - `budget_cents` is never negative.
//! - A `(project_id, employee_id)` membership pair is unique.

use super::{
    normalize_optional, nullable, now_epoch_ms, optional_text, require_text, wire_enum, RecordId,
    ValidationError, NAME_MAX_CHARS, TEXT_MAX_CHARS,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

wire_enum! {
    pub enum ProjectStatus {
        Planned => "planned",
        Active => "active",
        OnHold => "on_hold",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Planned
    }
}

wire_enum! {
    /// Role an employee plays inside one project.
    pub enum MemberRole {
        Lead => "lead",
        Contributor => "contributor",
        Reviewer => "reviewer",
    }
}

impl Default for MemberRole {
    fn default() -> Self {
        Self::Contributor
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: RecordId,
    pub client_id: RecordId,
    /// Employee accountable for the project.
    pub manager_id: Option<RecordId>,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub budget_cents: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProject {
    pub client_id: RecordId,
    #[serde(default)]
    pub manager_id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub budget_cents: Option<i64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub client_id: Option<RecordId>,
    #[serde(default, deserialize_with = "nullable")]
    pub manager_id: Option<Option<RecordId>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub budget_cents: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<NaiveDate>>,
}

impl Project {
    pub fn from_new(input: NewProject) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            client_id: input.client_id,
            manager_id: input.manager_id,
            name: input.name.trim().to_string(),
            description: normalize_optional(input.description),
            status: input.status,
            budget_cents: input.budget_cents,
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, patch: ProjectPatch) {
        if let Some(client_id) = patch.client_id {
            self.client_id = client_id;
        }
        if let Some(manager_id) = patch.manager_id {
            self.manager_id = manager_id;
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = normalize_optional(description);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(budget_cents) = patch.budget_cents {
            self.budget_cents = budget_cents;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, NAME_MAX_CHARS)?;
        optional_text("description", self.description.as_deref(), TEXT_MAX_CHARS)?;
        if matches!(self.budget_cents, Some(budget) if budget < 0) {
            return Err(ValidationError::NegativeAmount("budget_cents"));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ValidationError::DateRange { start, end });
            }
        }
        Ok(())
    }

    /// Returns whether `employee_id` is this project's manager.
    pub fn is_managed_by(&self, employee_id: RecordId) -> bool {
        self.manager_id == Some(employee_id)
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Membership of one employee in one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub project_id: RecordId,
    pub employee_id: RecordId,
    pub role: MemberRole,
    pub joined_at: i64,
}

/// Input for adding a member to a project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProjectMember {
    pub employee_id: RecordId,
    #[serde(default)]
    pub role: MemberRole,
}
