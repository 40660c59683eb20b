use crate::{respond, ApiError, AppState, Authenticated, ExternalJson, QueryParams, RecordPath};
use axum::extract::State;
use axum::response::Response;
use bizdesk_core::model::employee::{NewEmployee, EmployeePatch};
use bizdesk_core::query::ListQuery;
use bizdesk_core::repo::audit_repo::SqliteAuditRepository;
use bizdesk_core::repo::employee_repo::{EmployeeFilter, SqliteEmployeeRepository};
use bizdesk_core::service::EmployeeService;
use rusqlite::Connection;

fn service(
    conn: &Connection,
) -> EmployeeService<SqliteEmployeeRepository<'_>, SqliteAuditRepository<'_>> {
    EmployeeService::new(
        SqliteEmployeeRepository::new(conn),
        SqliteAuditRepository::new(conn),
    )
}

pub(crate) async fn list(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    QueryParams(params): QueryParams,
) -> Result<Response, ApiError> {
    let query = ListQuery::<EmployeeFilter>::from_params(&params)?;
    let page = state
        .read(|conn| Ok(service(conn).list(&principal, &query)?))
        .await?;
    respond::page(&page)
}

pub(crate) async fn get(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
) -> Result<Response, ApiError> {
    let employee = state
        .read(|conn| Ok(service(conn).get(&principal, id)?))
        .await?;
    respond::ok(&employee)
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ExternalJson(input): ExternalJson<NewEmployee>,
) -> Result<Response, ApiError> {
    let employee = state
        .write(|conn| Ok(service(conn).create(&principal, input)?))
        .await?;
    respond::created(&employee)
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
    ExternalJson(patch): ExternalJson<EmployeePatch>,
) -> Result<Response, ApiError> {
    let employee = state
        .write(|conn| Ok(service(conn).update(&principal, id, patch)?))
        .await?;
    respond::ok(&employee)
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
) -> Result<Response, ApiError> {
    let employee = state
        .write(|conn| Ok(service(conn).delete(&principal, id)?))
        .await?;
    respond::ok(&employee)
}
