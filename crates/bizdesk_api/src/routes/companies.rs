use crate::{respond, ApiError, AppState, Authenticated, ExternalJson, QueryParams, RecordPath};
use axum::extract::State;
use axum::response::Response;
use bizdesk_core::model::company::{NewCompany, CompanyPatch};
use bizdesk_core::query::ListQuery;
use bizdesk_core::repo::audit_repo::SqliteAuditRepository;
use bizdesk_core::repo::company_repo::{CompanyFilter, SqliteCompanyRepository};
use bizdesk_core::service::CompanyService;
use rusqlite::Connection;

fn service(
    conn: &Connection,
) -> CompanyService<SqliteCompanyRepository<'_>, SqliteAuditRepository<'_>> {
    CompanyService::new(
        SqliteCompanyRepository::new(conn),
        SqliteAuditRepository::new(conn),
    )
}

pub(crate) async fn list(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    QueryParams(params): QueryParams,
) -> Result<Response, ApiError> {
    let query = ListQuery::<CompanyFilter>::from_params(&params)?;
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
    let company = state
        .read(|conn| Ok(service(conn).get(&principal, id)?))
        .await?;
    respond::ok(&company)
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ExternalJson(input): ExternalJson<NewCompany>,
) -> Result<Response, ApiError> {
    let company = state
        .write(|conn| Ok(service(conn).create(&principal, input)?))
        .await?;
    respond::created(&company)
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
    ExternalJson(patch): ExternalJson<CompanyPatch>,
) -> Result<Response, ApiError> {
    let company = state
        .write(|conn| Ok(service(conn).update(&principal, id, patch)?))
        .await?;
    respond::ok(&company)
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
) -> Result<Response, ApiError> {
    let company = state
        .write(|conn| Ok(service(conn).delete(&principal, id)?))
        .await?;
    respond::ok(&company)
}
