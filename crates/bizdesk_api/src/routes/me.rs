use crate::{respond, ApiError, AppState, Authenticated};
use axum::extract::State;
use axum::response::Response;
use bizdesk_core::repo::audit_repo::SqliteAuditRepository;
use bizdesk_core::repo::user_repo::SqliteUserRepository;
use bizdesk_core::service::AuthService;
use serde_json::json;

/// Returns the calling user together with its effective role.
pub(crate) async fn me(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<Response, ApiError> {
    let user = state
        .read(|conn| {
            let auth =
                AuthService::new(SqliteUserRepository::new(conn), SqliteAuditRepository::new(conn));
            Ok(auth.me(&principal)?)
        })
        .await?;
    respond::ok(&json!({ "user": user, "role": principal.role }))
}
