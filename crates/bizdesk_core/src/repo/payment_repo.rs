//! Payment repository and its SQLite implementation.

use crate::auth::Scope;
use crate::model::payment::{Payment, PaymentStatus};
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

const PAYMENT_COLUMNS: &str = "id, client_id, project_id, amount_cents, currency, status, \
    method, paid_on, reference, created_at, updated_at, deleted_at";

const CLIENT_FK: ForeignKey = ForeignKey {
    column: "client_id",
    table: "clients",
    entity: "client",
};
const PROJECT_FK: ForeignKey = ForeignKey {
    column: "project_id",
    table: "projects",
    entity: "project",
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    pub client_id: Option<RecordId>,
    pub project_id: Option<RecordId>,
    pub status: Option<PaymentStatus>,
}

impl ListFilter for PaymentFilter {
    const SORT: SortSpec = SortSpec {
        columns: &["amount_cents", "status", "paid_on", "created_at", "updated_at"],
        default_column: "created_at",
        default_direction: SortDirection::Desc,
    };

    fn from_params(params: &Params) -> Result<Self, QueryError> {
        Ok(Self {
            client_id: param_id(params, "client_id")?,
            project_id: param_id(params, "project_id")?,
            status: param_enum(params, "status", PaymentStatus::parse)?,
        })
    }
}

pub struct SqlitePaymentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePaymentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordRepository<Payment> for SqlitePaymentRepository<'_> {
    type Filter = PaymentFilter;

    fn create(&self, payment: &Payment) -> RepoResult<RecordId> {
        payment.validate()?;
        CLIENT_FK.check_insert(self.conn, Some(payment.client_id))?;
        PROJECT_FK.check_insert(self.conn, payment.project_id)?;

        self.conn.execute(
            "INSERT INTO payments (
                id,
                client_id,
                project_id,
                amount_cents,
                currency,
                status,
                method,
                paid_on,
                reference,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                payment.id.to_string(),
                payment.client_id.to_string(),
                payment.project_id.map(|id| id.to_string()),
                payment.amount_cents,
                payment.currency.as_str(),
                payment.status,
                payment.method,
                payment.paid_on,
                payment.reference.as_deref(),
                payment.created_at,
                payment.updated_at,
            ],
        )?;

        Ok(payment.id)
    }

    fn update(&self, payment: &Payment) -> RepoResult<()> {
        payment.validate()?;
        PROJECT_FK.check_update(self.conn, "payments", payment.id, payment.project_id)?;

        let changed = self.conn.execute(
            "UPDATE payments
             SET
                project_id = ?1,
                amount_cents = ?2,
                currency = ?3,
                status = ?4,
                method = ?5,
                paid_on = ?6,
                reference = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?8
               AND deleted_at IS NULL;",
            params![
                payment.project_id.map(|id| id.to_string()),
                payment.amount_cents,
                payment.currency.as_str(),
                payment.status,
                payment.method,
                payment.paid_on,
                payment.reference.as_deref(),
                payment.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "payment",
                id: payment.id,
            });
        }
        Ok(())
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Payment>> {
        fetch_active(self.conn, "payments", PAYMENT_COLUMNS, id, parse_payment_row)
    }

    fn list(&self, query: &ListQuery<PaymentFilter>, scope: &Scope) -> RepoResult<Page<Payment>> {
        let mut conditions = Conditions::active();
        conditions.push_eq("client_id", query.filter.client_id.map(id_value));
        conditions.push_eq("project_id", query.filter.project_id.map(id_value));
        conditions.push_eq(
            "status",
            query
                .filter
                .status
                .map(|status| Value::Text(status.as_str().to_string())),
        );
        conditions.push_search(&["reference"], query.search.as_deref());
        conditions.push_scope(scope, |_, conditions| conditions.push("0 = 1", []));

        fetch_page(
            self.conn,
            "payments",
            PAYMENT_COLUMNS,
            conditions,
            &query.order,
            query.page,
            parse_payment_row,
        )
    }

    fn in_scope(&self, id: RecordId, scope: &Scope) -> RepoResult<bool> {
        let mut conditions = Conditions::active();
        conditions.push_scope(scope, |_, conditions| conditions.push("0 = 1", []));
        row_matches(self.conn, "payments", id, conditions)
    }

    fn soft_delete(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, "payments", "payment", id)
    }
}

fn parse_payment_row(row: &Row<'_>) -> RepoResult<Payment> {
    let payment = Payment {
        id: get_id(row, "id")?,
        client_id: get_id(row, "client_id")?,
        project_id: get_opt_id(row, "project_id")?,
        amount_cents: row.get("amount_cents")?,
        currency: row.get("currency")?,
        status: row.get("status")?,
        method: row.get("method")?,
        paid_on: row.get("paid_on")?,
        reference: row.get("reference")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    payment.validate()?;
    Ok(payment)
}
