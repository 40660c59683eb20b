//! Business domain model.
//!
//! # Responsibility
//! - Define canonical records for clients, companies, projects, milestones,
//!   employees, payments, communication logs, users and audit entries.
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId` (UUID v4).
//! - Deletion is represented by a `deleted_at` tombstone, never a hard delete.
//! - Timestamps are Unix epoch milliseconds; calendar dates are `NaiveDate`.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use uuid::Uuid;

pub mod audit;
pub mod client;
pub mod communication;
pub mod company;
pub mod employee;
pub mod milestone;
pub mod payment;
pub mod project;
pub mod user;

/// Stable identifier shared by every persisted record.
pub type RecordId = Uuid;

/// Maximum length for names, titles and subjects.
pub const NAME_MAX_CHARS: usize = 200;
/// Maximum length for free-form text such as notes and descriptions.
pub const TEXT_MAX_CHARS: usize = 10_000;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex must compile")
});

/// Field-level validation failure for domain records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} is not a valid email address: `{value}`")]
    InvalidEmail { field: &'static str, value: String },
    #[error("currency must be a three-letter uppercase code, got `{0}`")]
    InvalidCurrency(String),
    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),
    #[error("{0} must be greater than zero")]
    NonPositiveAmount(&'static str),
    #[error("end date {end} is earlier than start date {start}")]
    DateRange { start: NaiveDate, end: NaiveDate },
    #[error("completed_at must be set exactly when status is completed")]
    CompletionMismatch,
}

impl ValidationError {
    /// Name of the offending field, as persisted (snake_case).
    pub fn field(&self) -> &'static str {
        match self {
            Self::BlankField(field) | Self::NegativeAmount(field) | Self::NonPositiveAmount(field) => {
                field
            }
            Self::TooLong { field, .. } | Self::InvalidEmail { field, .. } => field,
            Self::InvalidCurrency(_) => "currency",
            Self::DateRange { .. } => "end_date",
            Self::CompletionMismatch => "completed_at",
        }
    }
}

/// Returns the current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Declares a closed string enum persisted and serialized by a stable wire name.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable wire/storage string.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Parses the stable wire/storage string. Matching is exact.
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                let text = value.as_str()?;
                Self::parse(text).ok_or_else(|| {
                    rusqlite::types::FromSqlError::Other(
                        format!("invalid {} value `{text}`", stringify!($name)).into(),
                    )
                })
            }
        }
    };
}

pub(crate) use wire_enum;

/// Deserializes a present-but-possibly-null field as `Some(inner)`.
///
/// Combined with `#[serde(default)]` this distinguishes an absent key
/// (`None`) from an explicit `null` (`Some(None)`) in patch payloads.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    check_len(field, value, max)
}

pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => check_len(field, value, max),
        None => Ok(()),
    }
}

pub(crate) fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::InvalidEmail {
            field,
            value: value.to_string(),
        });
    }
    check_len(field, value, NAME_MAX_CHARS)
}

pub(crate) fn optional_email(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(value) => require_email(field, value),
        None => Ok(()),
    }
}

/// Trims text and collapses blank strings to `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub(crate) fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
