//! Client records.
//!
//! # Invariants
//! - `name` is non-blank.
//! - `email`, when present, is lowercase and well-formed.
//! - `company_id`, when present, references a company (enforced by storage).

use super::{
    normalize_email, normalize_optional, nullable, now_epoch_ms, optional_email, optional_text,
    require_text, wire_enum, RecordId, ValidationError, NAME_MAX_CHARS, TEXT_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

wire_enum! {
    /// Sales lifecycle of a client.
    pub enum ClientStatus {
        /// Prospect, no signed work yet.
        Lead => "lead",
        Active => "active",
        Inactive => "inactive",
    }
}

impl Default for ClientStatus {
    fn default() -> Self {
        Self::Lead
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: RecordId,
    pub company_id: Option<RecordId>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: ClientStatus,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

/// Creation input for a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewClient {
    #[serde(default)]
    pub company_id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: ClientStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for a client. Absent keys keep the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub company_id: Option<Option<RecordId>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<ClientStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl Client {
    pub fn from_new(input: NewClient) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            company_id: input.company_id,
            name: input.name.trim().to_string(),
            email: normalize_optional(input.email).map(|email| normalize_email(&email)),
            phone: normalize_optional(input.phone),
            status: input.status,
            notes: normalize_optional(input.notes),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, patch: ClientPatch) {
        if let Some(company_id) = patch.company_id {
            self.company_id = company_id;
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = normalize_optional(email).map(|email| normalize_email(&email));
        }
        if let Some(phone) = patch.phone {
            self.phone = normalize_optional(phone);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = patch.notes {
            self.notes = normalize_optional(notes);
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, NAME_MAX_CHARS)?;
        optional_email("email", self.email.as_deref())?;
        optional_text("phone", self.phone.as_deref(), NAME_MAX_CHARS)?;
        optional_text("notes", self.notes.as_deref(), TEXT_MAX_CHARS)?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
