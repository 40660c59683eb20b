//! Request extractors that fail with JSON `ApiError`s instead of axum's
//! plain-text rejections.

use crate::{ApiError, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use bizdesk_core::auth::Principal;
use bizdesk_core::model::RecordId;
use bizdesk_core::query::Params;
use bizdesk_core::repo::audit_repo::SqliteAuditRepository;
use bizdesk_core::repo::user_repo::SqliteUserRepository;
use bizdesk_core::service::AuthService;
use bizdesk_core::transform::from_external;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

/// The caller resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Principal);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::unauthorized("malformed authorization header"))?
            .to_string();

        let principal = state
            .read(|conn| {
                let auth =
                    AuthService::new(SqliteUserRepository::new(conn), SqliteAuditRepository::new(conn));
                Ok(auth.authenticate(&token)?)
            })
            .await?;
        Ok(Self(principal))
    }
}

/// A camelCase JSON body decoded into a snake_case core input type.
#[derive(Debug)]
pub struct ExternalJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ExternalJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        if !value.is_object() {
            return Err(ApiError::invalid_body("request body must be a JSON object"));
        }
        from_external(value)
            .map(Self)
            .map_err(|err| ApiError::invalid_body(err.to_string()))
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(rejection.body_text())
    } else {
        ApiError::invalid_body(rejection.body_text())
    }
}

/// Raw query string parameters, keyed as sent.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(pub Params);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for QueryParams {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        let Query(params) = Query::<Params>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::invalid_query(rejection.body_text()))?;
        Ok(Self(params))
    }
}

/// The `:id` segment of a record route.
#[derive(Debug, Clone, Copy)]
pub struct RecordPath(pub RecordId);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RecordPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::invalid_query(rejection.body_text()))?;
        Ok(Self(parse_path_id("id", &raw)?))
    }
}

/// The `:id/members/:employee_id` segments of a membership route.
#[derive(Debug, Clone, Copy)]
pub struct MemberPath {
    pub project_id: RecordId,
    pub employee_id: RecordId,
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MemberPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        let Path((project_id, employee_id)) =
            Path::<(String, String)>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| ApiError::invalid_query(rejection.body_text()))?;
        Ok(Self {
            project_id: parse_path_id("id", &project_id)?,
            employee_id: parse_path_id("employeeId", &employee_id)?,
        })
    }
}

fn parse_path_id(name: &str, raw: &str) -> Result<RecordId, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::invalid_query(format!("path parameter `{name}` is not a valid id: `{raw}`")))
}
