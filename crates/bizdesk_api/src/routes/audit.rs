use crate::{respond, ApiError, AppState, Authenticated, QueryParams};
use axum::extract::State;
use axum::response::Response;
use bizdesk_core::query::ListQuery;
use bizdesk_core::repo::audit_repo::{AuditFilter, SqliteAuditRepository};
use bizdesk_core::service::AuditService;

pub(crate) async fn list(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    QueryParams(params): QueryParams,
) -> Result<Response, ApiError> {
    let query = ListQuery::<AuditFilter>::from_params(&params)?;
    let page = state
        .read(|conn| Ok(AuditService::new(SqliteAuditRepository::new(conn)).list(&principal, &query)?))
        .await?;
    respond::page(&page)
}
