//! JSON error envelope and status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bizdesk_core::query::QueryError;
use bizdesk_core::service::ServiceError;
use bizdesk_core::transform::to_camel_case;
use serde_json::{json, Map, Value};

/// An HTTP-facing failure rendered as
/// `{"success": false, "error": {"code", "message", "field"?}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    field: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_body", message)
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_query", message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Server-side failure. The detail is logged, never sent to the client.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        log::error!("event=http_error module=api status=error error={detail}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "internal server error",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Validation(err) => Self {
                field: Some(to_camel_case(err.field())),
                ..Self::new(StatusCode::BAD_REQUEST, "validation_failed", err.to_string())
            },
            ServiceError::Query(err) => err.into(),
            ServiceError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "not_found", value.to_string())
            }
            ServiceError::Forbidden(err) => {
                Self::new(StatusCode::FORBIDDEN, "forbidden", err.to_string())
            }
            ServiceError::Unauthorized(message) => Self::unauthorized(message),
            ServiceError::Conflict(message) => {
                Self::new(StatusCode::CONFLICT, "conflict", message)
            }
            ServiceError::InvalidReference(message) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_reference", message)
            }
            ServiceError::Repo(err) => Self::internal(err),
            ServiceError::Internal(details) => Self::internal(details),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(value: QueryError) -> Self {
        Self::invalid_query(value.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(value: rusqlite::Error) -> Self {
        Self::internal(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = Map::new();
        error.insert("code".to_string(), Value::from(self.code));
        error.insert("message".to_string(), Value::from(self.message));
        if let Some(field) = self.field {
            error.insert("field".to_string(), Value::from(field));
        }
        let body = json!({ "success": false, "error": error });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use bizdesk_core::auth::{AccessError, Action, Resource};
    use bizdesk_core::model::user::Role;
    use bizdesk_core::model::ValidationError;
    use bizdesk_core::service::ServiceError;
    use uuid::Uuid;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (
                ServiceError::Validation(ValidationError::BlankField("first_name")),
                StatusCode::BAD_REQUEST,
                "validation_failed",
            ),
            (
                ServiceError::NotFound {
                    entity: "client",
                    id: Uuid::new_v4(),
                },
                StatusCode::NOT_FOUND,
                "not_found",
            ),
            (
                ServiceError::Forbidden(AccessError::Forbidden {
                    role: Role::Employee,
                    resource: Resource::Payment,
                    action: Action::Read,
                }),
                StatusCode::FORBIDDEN,
                "forbidden",
            ),
            (
                ServiceError::Unauthorized("missing token"),
                StatusCode::UNAUTHORIZED,
                "unauthorized",
            ),
            (
                ServiceError::Conflict("duplicate".to_string()),
                StatusCode::CONFLICT,
                "conflict",
            ),
            (
                ServiceError::InvalidReference("client".to_string()),
                StatusCode::BAD_REQUEST,
                "invalid_reference",
            ),
            (
                ServiceError::Internal("read-back failed".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
            ),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn validation_errors_carry_camel_case_field() {
        let api = ApiError::from(ServiceError::Validation(ValidationError::BlankField(
            "first_name",
        )));
        assert_eq!(api.field.as_deref(), Some("firstName"));
    }
}
