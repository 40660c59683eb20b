//! Communication log records: calls, emails and meetings with clients.

use super::{
    normalize_optional, nullable, now_epoch_ms, optional_text, require_text, wire_enum, RecordId,
    ValidationError, NAME_MAX_CHARS, TEXT_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

wire_enum! {
    pub enum Channel {
        Email => "email",
        Phone => "phone",
        Meeting => "meeting",
        Chat => "chat",
        Other => "other",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationLog {
    pub id: RecordId,
    pub client_id: RecordId,
    /// Employee who had the conversation.
    pub employee_id: Option<RecordId>,
    pub channel: Channel,
    pub subject: String,
    pub summary: Option<String>,
    /// Epoch milliseconds when the conversation happened.
    pub occurred_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCommunicationLog {
    pub client_id: RecordId,
    #[serde(default)]
    pub employee_id: Option<RecordId>,
    pub channel: Channel,
    pub subject: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// Defaults to creation time when absent.
    #[serde(default)]
    pub occurred_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommunicationLogPatch {
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub summary: Option<Option<String>>,
    #[serde(default)]
    pub occurred_at: Option<i64>,
}

impl CommunicationLog {
    pub fn from_new(input: NewCommunicationLog) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            client_id: input.client_id,
            employee_id: input.employee_id,
            channel: input.channel,
            subject: input.subject.trim().to_string(),
            summary: normalize_optional(input.summary),
            occurred_at: input.occurred_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, patch: CommunicationLogPatch) {
        if let Some(channel) = patch.channel {
            self.channel = channel;
        }
        if let Some(subject) = patch.subject {
            self.subject = subject.trim().to_string();
        }
        if let Some(summary) = patch.summary {
            self.summary = normalize_optional(summary);
        }
        if let Some(occurred_at) = patch.occurred_at {
            self.occurred_at = occurred_at;
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("subject", &self.subject, NAME_MAX_CHARS)?;
        optional_text("summary", self.summary.as_deref(), TEXT_MAX_CHARS)?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
