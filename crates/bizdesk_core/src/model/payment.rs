//! Payment records received from clients.
//!
//! # Invariants
//! - `amount_cents` is strictly positive.
//! - `currency` is an ISO-4217 style three-letter uppercase code.

use super::{
    normalize_optional, nullable, now_epoch_ms, optional_text, wire_enum, RecordId,
    ValidationError, NAME_MAX_CHARS,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

wire_enum! {
    pub enum PaymentStatus {
        Pending => "pending",
        Paid => "paid",
        Overdue => "overdue",
        Refunded => "refunded",
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

wire_enum! {
    pub enum PaymentMethod {
        BankTransfer => "bank_transfer",
        Card => "card",
        Cash => "cash",
        Other => "other",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: RecordId,
    pub client_id: RecordId,
    pub project_id: Option<RecordId>,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub method: Option<PaymentMethod>,
    pub paid_on: Option<NaiveDate>,
    pub reference: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPayment {
    pub client_id: RecordId,
    #[serde(default)]
    pub project_id: Option<RecordId>,
    pub amount_cents: i64,
    pub currency: String,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub paid_on: Option<NaiveDate>,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub project_id: Option<Option<RecordId>>,
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub method: Option<Option<PaymentMethod>>,
    #[serde(default, deserialize_with = "nullable")]
    pub paid_on: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub reference: Option<Option<String>>,
}

impl Payment {
    pub fn from_new(input: NewPayment) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            client_id: input.client_id,
            project_id: input.project_id,
            amount_cents: input.amount_cents,
            currency: input.currency.trim().to_string(),
            status: input.status,
            method: input.method,
            paid_on: input.paid_on,
            reference: normalize_optional(input.reference),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, patch: PaymentPatch) {
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(amount_cents) = patch.amount_cents {
            self.amount_cents = amount_cents;
        }
        if let Some(currency) = patch.currency {
            self.currency = currency.trim().to_string();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(method) = patch.method {
            self.method = method;
        }
        if let Some(paid_on) = patch.paid_on {
            self.paid_on = paid_on;
        }
        if let Some(reference) = patch.reference {
            self.reference = normalize_optional(reference);
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount_cents <= 0 {
            return Err(ValidationError::NonPositiveAmount("amount_cents"));
        }
        let currency_ok =
            self.currency.len() == 3 && self.currency.chars().all(|c| c.is_ascii_uppercase());
        if !currency_ok {
            return Err(ValidationError::InvalidCurrency(self.currency.clone()));
        }
        optional_text("reference", self.reference.as_deref(), NAME_MAX_CHARS)?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{NewPayment, Payment, PaymentMethod, PaymentStatus};
    use crate::model::ValidationError;
    use uuid::Uuid;

    fn sample(amount_cents: i64, currency: &str) -> Payment {
        Payment::from_new(NewPayment {
            client_id: Uuid::new_v4(),
            project_id: None,
            amount_cents,
            currency: currency.to_string(),
            status: PaymentStatus::Paid,
            method: Some(PaymentMethod::BankTransfer),
            paid_on: None,
            reference: Some("INV-001".to_string()),
        })
    }

    #[test]
    fn payment_amount_must_be_positive() {
        assert!(sample(2500, "EUR").validate().is_ok());
        assert_eq!(
            sample(0, "EUR").validate(),
            Err(ValidationError::NonPositiveAmount("amount_cents"))
        );
    }

    #[test]
    fn currency_must_be_three_uppercase_letters() {
        assert_eq!(
            sample(100, "eur").validate(),
            Err(ValidationError::InvalidCurrency("eur".to_string()))
        );
        assert!(sample(100, "USDT").validate().is_err());
    }

    #[test]
    fn payment_method_wire_names_are_snake_case() {
        assert_eq!(PaymentMethod::BankTransfer.as_str(), "bank_transfer");
        let parsed: PaymentMethod = serde_json::from_str("\"card\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Card);
    }
}
