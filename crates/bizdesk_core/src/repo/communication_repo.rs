//! Communication log repository. `Scope::Own` matches logs the employee authored.

use crate::auth::Scope;
use crate::model::communication::{Channel, CommunicationLog};
use crate::model::RecordId;
use crate::query::{
    param_enum, param_id, ListFilter, ListQuery, Page, Params, QueryError, SortDirection, SortSpec,
};
use crate::repo::{
    fetch_active, fetch_page, get_id, get_opt_id, id_value, row_matches, soft_delete_row,
    Conditions, ForeignKey, RecordRepository, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

const COMMUNICATION_COLUMNS: &str = "id, client_id, employee_id, channel, subject, summary, \
    occurred_at, created_at, updated_at, deleted_at";

const CLIENT_FK: ForeignKey = ForeignKey {
    column: "client_id",
    table: "clients",
    entity: "client",
};
const EMPLOYEE_FK: ForeignKey = ForeignKey {
    column: "employee_id",
    table: "employees",
    entity: "employee",
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunicationFilter {
    pub client_id: Option<RecordId>,
    pub employee_id: Option<RecordId>,
    pub channel: Option<Channel>,
}

impl ListFilter for CommunicationFilter {
    const SORT: SortSpec = SortSpec {
        columns: &["occurred_at", "channel", "subject", "created_at"],
        default_column: "occurred_at",
        default_direction: SortDirection::Desc,
    };

    fn from_params(params: &Params) -> Result<Self, QueryError> {
        Ok(Self {
            client_id: param_id(params, "client_id")?,
            employee_id: param_id(params, "employee_id")?,
            channel: param_enum(params, "channel", Channel::parse)?,
        })
    }
}

pub struct SqliteCommunicationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommunicationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordRepository<CommunicationLog> for SqliteCommunicationRepository<'_> {
    type Filter = CommunicationFilter;

    fn create(&self, log: &CommunicationLog) -> RepoResult<RecordId> {
        log.validate()?;
        CLIENT_FK.check_insert(self.conn, Some(log.client_id))?;
        EMPLOYEE_FK.check_insert(self.conn, log.employee_id)?;

        self.conn.execute(
            "INSERT INTO communication_logs (
                id,
                client_id,
                employee_id,
                channel,
                subject,
                summary,
                occurred_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                log.id.to_string(),
                log.client_id.to_string(),
                log.employee_id.map(|id| id.to_string()),
                log.channel,
                log.subject.as_str(),
                log.summary.as_deref(),
                log.occurred_at,
                log.created_at,
                log.updated_at,
            ],
        )?;

        Ok(log.id)
    }

    fn update(&self, log: &CommunicationLog) -> RepoResult<()> {
        log.validate()?;

        let changed = self.conn.execute(
            "UPDATE communication_logs
             SET
                channel = ?1,
                subject = ?2,
                summary = ?3,
                occurred_at = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?5
               AND deleted_at IS NULL;",
            params![
                log.channel,
                log.subject.as_str(),
                log.summary.as_deref(),
                log.occurred_at,
                log.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "communication log",
                id: log.id,
            });
        }
        Ok(())
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<CommunicationLog>> {
        fetch_active(
            self.conn,
            "communication_logs",
            COMMUNICATION_COLUMNS,
            id,
            parse_communication_row,
        )
    }

    fn list(
        &self,
        query: &ListQuery<CommunicationFilter>,
        scope: &Scope,
    ) -> RepoResult<Page<CommunicationLog>> {
        let mut conditions = Conditions::active();
        conditions.push_eq("client_id", query.filter.client_id.map(id_value));
        conditions.push_eq("employee_id", query.filter.employee_id.map(id_value));
        conditions.push_eq(
            "channel",
            query
                .filter
                .channel
                .map(|channel| Value::Text(channel.as_str().to_string())),
        );
        conditions.push_search(&["subject", "summary"], query.search.as_deref());
        conditions.push_scope(scope, push_own_communication);

        fetch_page(
            self.conn,
            "communication_logs",
            COMMUNICATION_COLUMNS,
            conditions,
            &query.order,
            query.page,
            parse_communication_row,
        )
    }

    fn in_scope(&self, id: RecordId, scope: &Scope) -> RepoResult<bool> {
        let mut conditions = Conditions::active();
        conditions.push_scope(scope, push_own_communication);
        row_matches(self.conn, "communication_logs", id, conditions)
    }

    fn soft_delete(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, "communication_logs", "communication log", id)
    }
}

fn push_own_communication(employee_id: RecordId, conditions: &mut Conditions) {
    conditions.push("employee_id = ?", [id_value(employee_id)]);
}

fn parse_communication_row(row: &Row<'_>) -> RepoResult<CommunicationLog> {
    let log = CommunicationLog {
        id: get_id(row, "id")?,
        client_id: get_id(row, "client_id")?,
        employee_id: get_opt_id(row, "employee_id")?,
        channel: row.get("channel")?,
        subject: row.get("subject")?,
        summary: row.get("summary")?,
        occurred_at: row.get("occurred_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    log.validate()?;
    Ok(log)
}
