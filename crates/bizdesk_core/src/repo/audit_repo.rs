//! Append-only audit log storage.

use crate::model::audit::{AuditAction, AuditLog};
use crate::model::RecordId;
use crate::query::{
    param_enum, param_id, param_text, ListFilter, ListQuery, Page, Params, QueryError,
    SortDirection, SortSpec,
};
use crate::repo::{
    fetch_page, get_id, get_opt_id, id_value, text_value, Conditions, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

const AUDIT_COLUMNS: &str = "id, actor_user_id, action, entity, entity_id, changes, created_at";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// Entity table name, e.g. `projects`.
    pub entity: Option<String>,
    pub entity_id: Option<RecordId>,
    pub actor_user_id: Option<RecordId>,
    pub action: Option<AuditAction>,
}

impl ListFilter for AuditFilter {
    const SORT: SortSpec = SortSpec {
        columns: &["created_at", "entity", "action"],
        default_column: "created_at",
        default_direction: SortDirection::Desc,
    };

    fn from_params(params: &Params) -> Result<Self, QueryError> {
        Ok(Self {
            entity: param_text(params, "entity"),
            entity_id: param_id(params, "entity_id")?,
            actor_user_id: param_id(params, "actor_user_id")?,
            action: param_enum(params, "action", AuditAction::parse)?,
        })
    }
}

pub trait AuditRepository {
    fn record(&self, entry: &AuditLog) -> RepoResult<()>;
    fn list(&self, query: &ListQuery<AuditFilter>) -> RepoResult<Page<AuditLog>>;
}

#[derive(Clone, Copy)]
pub struct SqliteAuditRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuditRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AuditRepository for SqliteAuditRepository<'_> {
    fn record(&self, entry: &AuditLog) -> RepoResult<()> {
        let changes = entry
            .changes
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| RepoError::InvalidData(format!("audit changes: {err}")))?;

        self.conn.execute(
            "INSERT INTO audit_logs (
                id,
                actor_user_id,
                action,
                entity,
                entity_id,
                changes,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                entry.id.to_string(),
                entry.actor_user_id.map(|id| id.to_string()),
                entry.action,
                entry.entity.as_str(),
                entry.entity_id.to_string(),
                changes,
                entry.created_at,
            ],
        )?;
        Ok(())
    }

    fn list(&self, query: &ListQuery<AuditFilter>) -> RepoResult<Page<AuditLog>> {
        // Audit rows are never soft-deleted.
        let mut conditions = Conditions::default();
        if let Some(entity) = query.filter.entity.as_deref() {
            conditions.push("entity = ?", [text_value(entity)]);
        }
        conditions.push_eq("entity_id", query.filter.entity_id.map(id_value));
        conditions.push_eq("actor_user_id", query.filter.actor_user_id.map(id_value));
        conditions.push_eq(
            "action",
            query
                .filter
                .action
                .map(|action| Value::Text(action.as_str().to_string())),
        );

        fetch_page(
            self.conn,
            "audit_logs",
            AUDIT_COLUMNS,
            conditions,
            &query.order,
            query.page,
            parse_audit_row,
        )
    }
}

fn parse_audit_row(row: &Row<'_>) -> RepoResult<AuditLog> {
    let changes = row
        .get::<_, Option<String>>("changes")?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|err| RepoError::InvalidData(format!("audit changes: {err}")))?;

    Ok(AuditLog {
        id: get_id(row, "id")?,
        actor_user_id: get_opt_id(row, "actor_user_id")?,
        action: row.get("action")?,
        entity: row.get("entity")?,
        entity_id: get_id(row, "entity_id")?,
        changes,
        created_at: row.get("created_at")?,
    })
}
