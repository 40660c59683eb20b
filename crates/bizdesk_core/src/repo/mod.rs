//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must call `validate()` on the record before SQL mutations.
//! - Read paths only return active rows (`deleted_at IS NULL`).
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`,
//!   `InvalidReference`) in addition to DB transport errors.

use crate::auth::Scope;
use crate::db::DbError;
use crate::model::{RecordId, ValidationError};
use crate::query::{ListFilter, ListQuery, OrderBy, Page, PageMeta, PageRequest};
use rusqlite::ffi;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use thiserror::Error;
use uuid::Uuid;

pub mod audit_repo;
pub mod client_repo;
pub mod communication_repo;
pub mod company_repo;
pub mod employee_repo;
pub mod milestone_repo;
pub mod payment_repo;
pub mod project_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: RecordId },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid reference: {0}")]
    InvalidReference(String),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        let extended_code = match &value {
            rusqlite::Error::SqliteFailure(err, _) => Some(err.extended_code),
            _ => None,
        };
        match extended_code {
            Some(ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
                Self::Conflict(value.to_string())
            }
            Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => Self::InvalidReference(value.to_string()),
            _ if matches!(
                value,
                rusqlite::Error::FromSqlConversionFailure(..)
                    | rusqlite::Error::InvalidColumnType(..)
            ) =>
            {
                Self::InvalidData(value.to_string())
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// CRUD contract shared by every soft-deletable business record.
pub trait RecordRepository<T> {
    type Filter: ListFilter;

    /// Inserts a validated record and returns its id.
    fn create(&self, record: &T) -> RepoResult<RecordId>;
    /// Replaces all mutable columns of an active record.
    fn update(&self, record: &T) -> RepoResult<()>;
    /// Loads one active record.
    fn get(&self, id: RecordId) -> RepoResult<Option<T>>;
    /// Lists active records matching the query, restricted to `scope`.
    fn list(&self, query: &ListQuery<Self::Filter>, scope: &Scope) -> RepoResult<Page<T>>;
    /// Returns whether the active record `id` falls inside `scope`.
    fn in_scope(&self, id: RecordId, scope: &Scope) -> RepoResult<bool>;
    /// Tombstones one active record.
    fn soft_delete(&self, id: RecordId) -> RepoResult<()>;
}

/// Accumulates `WHERE` predicates and their bind values.
#[derive(Debug, Default)]
pub(crate) struct Conditions {
    clauses: Vec<String>,
    binds: Vec<Value>,
}

impl Conditions {
    /// Starts with the active-row predicate.
    pub(crate) fn active() -> Self {
        let mut conditions = Self::default();
        conditions.push("deleted_at IS NULL", []);
        conditions
    }

    pub(crate) fn push(&mut self, clause: &str, values: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.to_string());
        self.binds.extend(values);
    }

    pub(crate) fn push_eq(&mut self, column: &str, value: Option<Value>) {
        if let Some(value) = value {
            self.push(&format!("{column} = ?"), [value]);
        }
    }

    /// Adds a case-insensitive substring match over `columns`.
    pub(crate) fn push_search(&mut self, columns: &[&str], term: Option<&str>) {
        let Some(term) = term else {
            return;
        };
        let pattern = format!("%{}%", escape_like(term));
        let clause = columns
            .iter()
            .map(|column| format!("{column} LIKE ? ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.push(
            &format!("({clause})"),
            columns.iter().map(|_| Value::Text(pattern.clone())),
        );
    }

    /// Adds a predicate rendered from `scope`; `Scope::Empty` matches nothing.
    pub(crate) fn push_scope(&mut self, scope: &Scope, render: impl FnOnce(RecordId, &mut Self)) {
        match scope {
            Scope::All => {}
            Scope::Own(id) => render(*id, self),
            Scope::Empty => self.push("0 = 1", []),
        }
    }

    fn to_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

/// Runs a count query plus a windowed select over `table`.
pub(crate) fn fetch_page<T>(
    conn: &Connection,
    table: &str,
    select_columns: &str,
    conditions: Conditions,
    order: &OrderBy,
    page: PageRequest,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Page<T>> {
    let where_sql = conditions.to_sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table}{where_sql};"),
        params_from_iter(conditions.binds.iter()),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {select_columns} FROM {table}{where_sql} {} LIMIT ? OFFSET ?;",
        order.to_sql()
    );
    let mut binds = conditions.binds;
    binds.push(Value::Integer(i64::from(page.limit())));
    binds.push(Value::Integer(
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    ));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(binds))?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row)?);
    }

    Ok(Page {
        items,
        meta: PageMeta::new(page, u64::try_from(total).unwrap_or(0)),
    })
}

/// Loads at most one row matching `id` among active rows of `table`.
pub(crate) fn fetch_active<T>(
    conn: &Connection,
    table: &str,
    select_columns: &str,
    id: RecordId,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Option<T>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {select_columns} FROM {table} WHERE id = ?1 AND deleted_at IS NULL;"
    ))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse(row)?)),
        None => Ok(None),
    }
}

/// Returns whether active row `id` of `table` satisfies `conditions`.
pub(crate) fn row_matches(
    conn: &Connection,
    table: &str,
    id: RecordId,
    mut conditions: Conditions,
) -> RepoResult<bool> {
    conditions.push("id = ?", [id_value(id)]);
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {table}{});",
            conditions.to_sql()
        ),
        params_from_iter(conditions.binds.iter()),
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// A reference column whose target must be an active row.
///
/// SQLite foreign keys only see that the parent row exists, so tombstoned
/// parents are rejected here before the write.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ForeignKey {
    pub(crate) column: &'static str,
    pub(crate) table: &'static str,
    pub(crate) entity: &'static str,
}

impl ForeignKey {
    /// `InvalidReference` unless `target` is absent or an active parent row.
    pub(crate) fn check_insert(
        &self,
        conn: &Connection,
        target: Option<RecordId>,
    ) -> RepoResult<()> {
        let Some(target) = target else {
            return Ok(());
        };
        let active: i64 = conn.query_row(
            &format!(
                "SELECT EXISTS(
                    SELECT 1 FROM {} WHERE id = ?1 AND deleted_at IS NULL
                );",
                self.table
            ),
            [target.to_string()],
            |row| row.get(0),
        )?;
        self.verdict(active == 1, target)
    }

    /// Like [`Self::check_insert`], but a value unchanged from the stored row
    /// `owner_id` of `owner_table` is kept even if its parent was deleted.
    pub(crate) fn check_update(
        &self,
        conn: &Connection,
        owner_table: &str,
        owner_id: RecordId,
        target: Option<RecordId>,
    ) -> RepoResult<()> {
        let Some(target) = target else {
            return Ok(());
        };
        let accepted: i64 = conn.query_row(
            &format!(
                "SELECT EXISTS(
                    SELECT 1 FROM {table} WHERE id = ?1 AND deleted_at IS NULL
                ) OR EXISTS(
                    SELECT 1 FROM {owner_table} WHERE id = ?2 AND {column} = ?1
                );",
                table = self.table,
                column = self.column,
            ),
            [target.to_string(), owner_id.to_string()],
            |row| row.get(0),
        )?;
        self.verdict(accepted == 1, target)
    }

    fn verdict(&self, ok: bool, target: RecordId) -> RepoResult<()> {
        if ok {
            Ok(())
        } else {
            Err(RepoError::InvalidReference(format!(
                "{} {target} does not exist",
                self.entity
            )))
        }
    }
}

/// Sets `deleted_at` on an active row; `NotFound` when none was changed.
pub(crate) fn soft_delete_row(
    conn: &Connection,
    table: &str,
    entity: &'static str,
    id: RecordId,
) -> RepoResult<()> {
    let changed = conn.execute(
        &format!(
            "UPDATE {table}
             SET
                deleted_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ),
        [id.to_string()],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(())
}

pub(crate) fn id_value(id: RecordId) -> Value {
    Value::Text(id.to_string())
}

pub(crate) fn text_value(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub(crate) fn get_id(row: &Row<'_>, column: &str) -> RepoResult<RecordId> {
    let text: String = row.get(column)?;
    parse_id(&text, column)
}

pub(crate) fn get_opt_id(row: &Row<'_>, column: &str) -> RepoResult<Option<RecordId>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => Ok(Some(parse_id(&text, column)?)),
        None => Ok(None),
    }
}

pub(crate) fn parse_id(text: &str, column: &str) -> RepoResult<RecordId> {
    Uuid::parse_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
