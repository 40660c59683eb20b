//! Company records: the organisations clients belong to.

use super::{
    normalize_optional, nullable, now_epoch_ms, optional_text, require_text, RecordId,
    ValidationError, NAME_MAX_CHARS, TEXT_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: RecordId,
    pub name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

/// Creation input for a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Partial update for a company. Absent keys keep the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompanyPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub industry: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
}

impl Company {
    pub fn from_new(input: NewCompany) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            industry: normalize_optional(input.industry),
            website: normalize_optional(input.website),
            phone: normalize_optional(input.phone),
            address: normalize_optional(input.address),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, patch: CompanyPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(industry) = patch.industry {
            self.industry = normalize_optional(industry);
        }
        if let Some(website) = patch.website {
            self.website = normalize_optional(website);
        }
        if let Some(phone) = patch.phone {
            self.phone = normalize_optional(phone);
        }
        if let Some(address) = patch.address {
            self.address = normalize_optional(address);
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, NAME_MAX_CHARS)?;
        optional_text("industry", self.industry.as_deref(), NAME_MAX_CHARS)?;
        optional_text("website", self.website.as_deref(), NAME_MAX_CHARS)?;
        optional_text("phone", self.phone.as_deref(), NAME_MAX_CHARS)?;
        optional_text("address", self.address.as_deref(), TEXT_MAX_CHARS)?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
