use crate::{respond, ApiError, AppState};
use axum::extract::State;
use axum::response::Response;
use serde_json::json;

/// Unauthenticated liveness check that also pings the database.
pub(crate) async fn health(State(state): State<AppState>) -> Result<Response, ApiError> {
    state
        .read(|conn| Ok(conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))?))
        .await?;
    respond::ok(&json!({
        "status": "ok",
        "version": bizdesk_core::core_version(),
    }))
}
