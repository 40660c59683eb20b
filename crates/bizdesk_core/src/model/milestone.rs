//! Milestone records: dated checkpoints inside a project.
//!
//! # Invariants
//! - A milestone belongs to exactly one project and never moves between projects.
//! - `completed_at` is set exactly when `status == Completed`.

use super::{
    normalize_optional, nullable, now_epoch_ms, optional_text, require_text, wire_enum, RecordId,
    ValidationError, NAME_MAX_CHARS, TEXT_MAX_CHARS,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

wire_enum! {
    pub enum MilestoneStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Blocked => "blocked",
    }
}

impl Default for MilestoneStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: RecordId,
    pub project_id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub status: MilestoneStatus,
    pub due_date: Option<NaiveDate>,
    /// Epoch milliseconds of the transition into `Completed`.
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewMilestone {
    pub project_id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: MilestoneStatus,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MilestonePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<MilestoneStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl Milestone {
    pub fn from_new(input: NewMilestone) -> Self {
        let now = now_epoch_ms();
        let mut milestone = Self {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            title: input.title.trim().to_string(),
            description: normalize_optional(input.description),
            status: MilestoneStatus::Pending,
            due_date: input.due_date,
            completed_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        milestone.set_status(input.status, now);
        milestone
    }

    pub fn apply(&mut self, patch: MilestonePatch) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = normalize_optional(description);
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = patch.status {
            self.set_status(status, now_epoch_ms());
        }
    }

    /// Moves the milestone to `status`, stamping or clearing `completed_at`.
    ///
    /// Re-applying `Completed` keeps the original completion time.
    pub fn set_status(&mut self, status: MilestoneStatus, now: i64) {
        match (self.status, status) {
            (MilestoneStatus::Completed, MilestoneStatus::Completed) => {
                if self.completed_at.is_none() {
                    self.completed_at = Some(now);
                }
            }
            (_, MilestoneStatus::Completed) => self.completed_at = Some(now),
            _ => self.completed_at = None,
        }
        self.status = status;
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, NAME_MAX_CHARS)?;
        optional_text("description", self.description.as_deref(), TEXT_MAX_CHARS)?;
        let completed = self.status == MilestoneStatus::Completed;
        if completed != self.completed_at.is_some() {
            return Err(ValidationError::CompletionMismatch);
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Milestone, MilestonePatch, MilestoneStatus, NewMilestone};
    use crate::model::ValidationError;
    use uuid::Uuid;

    fn sample(status: MilestoneStatus) -> Milestone {
        Milestone::from_new(NewMilestone {
            project_id: Uuid::new_v4(),
            title: "Design sign-off".to_string(),
            description: None,
            status,
            due_date: None,
        })
    }

    #[test]
    fn creating_completed_milestone_stamps_completion() {
        let milestone = sample(MilestoneStatus::Completed);
        assert!(milestone.completed_at.is_some());
        assert!(milestone.validate().is_ok());
    }

    #[test]
    fn status_transitions_maintain_completed_at() {
        let mut milestone = sample(MilestoneStatus::Pending);
        assert_eq!(milestone.completed_at, None);

        milestone.set_status(MilestoneStatus::Completed, 42);
        assert_eq!(milestone.completed_at, Some(42));

        milestone.set_status(MilestoneStatus::Completed, 99);
        assert_eq!(milestone.completed_at, Some(42));

        milestone.apply(MilestonePatch {
            status: Some(MilestoneStatus::InProgress),
            ..MilestonePatch::default()
        });
        assert_eq!(milestone.completed_at, None);
        assert!(milestone.validate().is_ok());
    }

    #[test]
    fn inconsistent_completion_state_fails_validation() {
        let mut milestone = sample(MilestoneStatus::Pending);
        milestone.completed_at = Some(1);
        assert_eq!(
            milestone.validate(),
            Err(ValidationError::CompletionMismatch)
        );
    }
}
