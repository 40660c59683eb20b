use crate::{respond, ApiError, AppState, Authenticated, ExternalJson, QueryParams, RecordPath};
use axum::extract::State;
use axum::response::Response;
use bizdesk_core::model::communication::{CommunicationLogPatch, NewCommunicationLog};
use bizdesk_core::query::ListQuery;
use bizdesk_core::repo::audit_repo::SqliteAuditRepository;
use bizdesk_core::repo::communication_repo::{CommunicationFilter, SqliteCommunicationRepository};
use bizdesk_core::service::CommunicationService;
use rusqlite::Connection;

fn service(
    conn: &Connection,
) -> CommunicationService<SqliteCommunicationRepository<'_>, SqliteAuditRepository<'_>> {
    CommunicationService::new(
        SqliteCommunicationRepository::new(conn),
        SqliteAuditRepository::new(conn),
    )
}

/// Employees only see logs they authored.
pub(crate) async fn list(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    QueryParams(params): QueryParams,
) -> Result<Response, ApiError> {
    let query = ListQuery::<CommunicationFilter>::from_params(&params)?;
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
    let log = state
        .read(|conn| Ok(service(conn).get(&principal, id)?))
        .await?;
    respond::ok(&log)
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ExternalJson(input): ExternalJson<NewCommunicationLog>,
) -> Result<Response, ApiError> {
    let log = state
        .write(|conn| Ok(service(conn).create(&principal, input)?))
        .await?;
    respond::created(&log)
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
    ExternalJson(patch): ExternalJson<CommunicationLogPatch>,
) -> Result<Response, ApiError> {
    let log = state
        .write(|conn| Ok(service(conn).update(&principal, id, patch)?))
        .await?;
    respond::ok(&log)
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
) -> Result<Response, ApiError> {
    let log = state
        .write(|conn| Ok(service(conn).delete(&principal, id)?))
        .await?;
    respond::ok(&log)
}
