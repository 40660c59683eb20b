use crate::{
    respond, ApiError, AppState, Authenticated, ExternalJson, MemberPath, QueryParams, RecordPath,
};
use axum::extract::State;
use axum::response::Response;
use bizdesk_core::model::project::{NewProject, NewProjectMember, ProjectPatch};
use bizdesk_core::query::ListQuery;
use bizdesk_core::repo::audit_repo::SqliteAuditRepository;
use bizdesk_core::repo::project_repo::{ProjectFilter, SqliteProjectRepository};
use bizdesk_core::service::ProjectService;
use rusqlite::Connection;

fn service(
    conn: &Connection,
) -> ProjectService<SqliteProjectRepository<'_>, SqliteAuditRepository<'_>> {
    ProjectService::new(
        SqliteProjectRepository::new(conn),
        SqliteAuditRepository::new(conn),
    )
}

pub(crate) async fn list(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    QueryParams(params): QueryParams,
) -> Result<Response, ApiError> {
    let query = ListQuery::<ProjectFilter>::from_params(&params)?;
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
    let project = state
        .read(|conn| Ok(service(conn).get(&principal, id)?))
        .await?;
    respond::ok(&project)
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ExternalJson(input): ExternalJson<NewProject>,
) -> Result<Response, ApiError> {
    let project = state
        .write(|conn| Ok(service(conn).create(&principal, input)?))
        .await?;
    respond::created(&project)
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
    ExternalJson(patch): ExternalJson<ProjectPatch>,
) -> Result<Response, ApiError> {
    let project = state
        .write(|conn| Ok(service(conn).update(&principal, id, patch)?))
        .await?;
    respond::ok(&project)
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
) -> Result<Response, ApiError> {
    let project = state
        .write(|conn| Ok(service(conn).delete(&principal, id)?))
        .await?;
    respond::ok(&project)
}

pub(crate) async fn list_members(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(project_id): RecordPath,
) -> Result<Response, ApiError> {
    let members = state
        .read(|conn| Ok(service(conn).list_members(&principal, project_id)?))
        .await?;
    respond::ok(&members)
}

pub(crate) async fn add_member(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(project_id): RecordPath,
    ExternalJson(input): ExternalJson<NewProjectMember>,
) -> Result<Response, ApiError> {
    let member = state
        .write(|conn| Ok(service(conn).add_member(&principal, project_id, input)?))
        .await?;
    respond::created(&member)
}

pub(crate) async fn remove_member(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    path: MemberPath,
) -> Result<Response, ApiError> {
    let member = state
        .write(|conn| {
            Ok(service(conn).remove_member(&principal, path.project_id, path.employee_id)?)
        })
        .await?;
    respond::ok(&member)
}
