//! Append-only audit trail of record mutations.

use super::{now_epoch_ms, wire_enum, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

wire_enum! {
    pub enum AuditAction {
        Create => "create",
        Update => "update",
        Delete => "delete",
    }
}

/// One persisted audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: RecordId,
    /// `None` for mutations performed by maintenance tooling.
    pub actor_user_id: Option<RecordId>,
    pub action: AuditAction,
    /// Entity table name, e.g. `projects`.
    pub entity: String,
    pub entity_id: RecordId,
    /// Snapshot of the record after the mutation (before it, for deletes).
    pub changes: Option<Value>,
    pub created_at: i64,
}

impl AuditLog {
    pub fn new(
        actor_user_id: Option<RecordId>,
        action: AuditAction,
        entity: &str,
        entity_id: RecordId,
        changes: Option<Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_user_id,
            action,
            entity: entity.to_string(),
            entity_id,
            changes,
            created_at: now_epoch_ms(),
        }
    }
}
