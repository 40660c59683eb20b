use crate::{respond, ApiError, AppState, Authenticated, ExternalJson, QueryParams, RecordPath};
use axum::extract::State;
use axum::response::Response;
use bizdesk_core::model::client::{ClientPatch, NewClient};
use bizdesk_core::query::ListQuery;
use bizdesk_core::repo::audit_repo::SqliteAuditRepository;
use bizdesk_core::repo::client_repo::{ClientFilter, SqliteClientRepository};
use bizdesk_core::service::ClientService;
use rusqlite::Connection;

fn service(
    conn: &Connection,
) -> ClientService<SqliteClientRepository<'_>, SqliteAuditRepository<'_>> {
    ClientService::new(
        SqliteClientRepository::new(conn),
        SqliteAuditRepository::new(conn),
    )
}

pub(crate) async fn list(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    QueryParams(params): QueryParams,
) -> Result<Response, ApiError> {
    let query = ListQuery::<ClientFilter>::from_params(&params)?;
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
    let client = state
        .read(|conn| Ok(service(conn).get(&principal, id)?))
        .await?;
    respond::ok(&client)
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ExternalJson(input): ExternalJson<NewClient>,
) -> Result<Response, ApiError> {
    let client = state
        .write(|conn| Ok(service(conn).create(&principal, input)?))
        .await?;
    respond::created(&client)
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
    ExternalJson(patch): ExternalJson<ClientPatch>,
) -> Result<Response, ApiError> {
    let client = state
        .write(|conn| Ok(service(conn).update(&principal, id, patch)?))
        .await?;
    respond::ok(&client)
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
) -> Result<Response, ApiError> {
    let client = state
        .write(|conn| Ok(service(conn).delete(&principal, id)?))
        .await?;
    respond::ok(&client)
}
