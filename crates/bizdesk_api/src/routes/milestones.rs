use crate::{respond, ApiError, AppState, Authenticated, ExternalJson, QueryParams, RecordPath};
use axum::extract::State;
use axum::response::Response;
use bizdesk_core::model::milestone::{MilestonePatch, NewMilestone};
use bizdesk_core::query::ListQuery;
use bizdesk_core::repo::audit_repo::SqliteAuditRepository;
use bizdesk_core::repo::milestone_repo::{MilestoneFilter, SqliteMilestoneRepository};
use bizdesk_core::repo::project_repo::SqliteProjectRepository;
use bizdesk_core::service::MilestoneService;
use rusqlite::Connection;

type Service<'conn> = MilestoneService<
    SqliteMilestoneRepository<'conn>,
    SqliteProjectRepository<'conn>,
    SqliteAuditRepository<'conn>,
>;

fn service(conn: &Connection) -> Service<'_> {
    MilestoneService::new(
        SqliteMilestoneRepository::new(conn),
        SqliteProjectRepository::new(conn),
        SqliteAuditRepository::new(conn),
    )
}

/// Lists milestones; `?projectId=` narrows to one project.
pub(crate) async fn list(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    QueryParams(params): QueryParams,
) -> Result<Response, ApiError> {
    let query = ListQuery::<MilestoneFilter>::from_params(&params)?;
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
    let milestone = state
        .read(|conn| Ok(service(conn).get(&principal, id)?))
        .await?;
    respond::ok(&milestone)
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ExternalJson(input): ExternalJson<NewMilestone>,
) -> Result<Response, ApiError> {
    let milestone = state
        .write(|conn| Ok(service(conn).create(&principal, input)?))
        .await?;
    respond::created(&milestone)
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
    ExternalJson(patch): ExternalJson<MilestonePatch>,
) -> Result<Response, ApiError> {
    let milestone = state
        .write(|conn| Ok(service(conn).update(&principal, id, patch)?))
        .await?;
    respond::ok(&milestone)
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    RecordPath(id): RecordPath,
) -> Result<Response, ApiError> {
    let milestone = state
        .write(|conn| Ok(service(conn).delete(&principal, id)?))
        .await?;
    respond::ok(&milestone)
}
