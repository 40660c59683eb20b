//! Client repository and its SQLite implementation.

use crate::auth::Scope;
use crate::model::client::{Client, ClientStatus};
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

const CLIENT_COLUMNS: &str = "id, company_id, name, email, phone, status, notes, \
    created_at, updated_at, deleted_at";

const COMPANY_FK: ForeignKey = ForeignKey {
    column: "company_id",
    table: "companies",
    entity: "company",
};

/// List filters for clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilter {
    pub company_id: Option<RecordId>,
    pub status: Option<ClientStatus>,
}

impl ListFilter for ClientFilter {
    const SORT: SortSpec = SortSpec {
        columns: &["name", "email", "status", "created_at", "updated_at"],
        default_column: "created_at",
        default_direction: SortDirection::Desc,
    };

    fn from_params(params: &Params) -> Result<Self, QueryError> {
        Ok(Self {
            company_id: param_id(params, "company_id")?,
            status: param_enum(params, "status", ClientStatus::parse)?,
        })
    }
}

pub struct SqliteClientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClientRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordRepository<Client> for SqliteClientRepository<'_> {
    type Filter = ClientFilter;

    fn create(&self, client: &Client) -> RepoResult<RecordId> {
        client.validate()?;
        COMPANY_FK.check_insert(self.conn, client.company_id)?;

        self.conn.execute(
            "INSERT INTO clients (
                id,
                company_id,
                name,
                email,
                phone,
                status,
                notes,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                client.id.to_string(),
                client.company_id.map(|id| id.to_string()),
                client.name.as_str(),
                client.email.as_deref(),
                client.phone.as_deref(),
                client.status,
                client.notes.as_deref(),
                client.created_at,
                client.updated_at,
            ],
        )?;

        Ok(client.id)
    }

    fn update(&self, client: &Client) -> RepoResult<()> {
        client.validate()?;
        COMPANY_FK.check_update(self.conn, "clients", client.id, client.company_id)?;

        let changed = self.conn.execute(
            "UPDATE clients
             SET
                company_id = ?1,
                name = ?2,
                email = ?3,
                phone = ?4,
                status = ?5,
                notes = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?7
               AND deleted_at IS NULL;",
            params![
                client.company_id.map(|id| id.to_string()),
                client.name.as_str(),
                client.email.as_deref(),
                client.phone.as_deref(),
                client.status,
                client.notes.as_deref(),
                client.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "client",
                id: client.id,
            });
        }
        Ok(())
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Client>> {
        fetch_active(self.conn, "clients", CLIENT_COLUMNS, id, parse_client_row)
    }

    fn list(&self, query: &ListQuery<ClientFilter>, scope: &Scope) -> RepoResult<Page<Client>> {
        let mut conditions = Conditions::active();
        conditions.push_eq("company_id", query.filter.company_id.map(id_value));
        conditions.push_eq(
            "status",
            query
                .filter
                .status
                .map(|status| Value::Text(status.as_str().to_string())),
        );
        conditions.push_search(&["name", "email"], query.search.as_deref());
        conditions.push_scope(scope, |_, conditions| conditions.push("0 = 1", []));

        fetch_page(
            self.conn,
            "clients",
            CLIENT_COLUMNS,
            conditions,
            &query.order,
            query.page,
            parse_client_row,
        )
    }

    fn in_scope(&self, id: RecordId, scope: &Scope) -> RepoResult<bool> {
        let mut conditions = Conditions::active();
        conditions.push_scope(scope, |_, conditions| conditions.push("0 = 1", []));
        row_matches(self.conn, "clients", id, conditions)
    }

    fn soft_delete(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, "clients", "client", id)
    }
}

fn parse_client_row(row: &Row<'_>) -> RepoResult<Client> {
    let client = Client {
        id: get_id(row, "id")?,
        company_id: get_opt_id(row, "company_id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        status: row.get("status")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    client.validate()?;
    Ok(client)
}
