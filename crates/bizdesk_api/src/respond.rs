//! Success envelopes: `{"success": true, "data": …, "meta"?: …}`.

use crate::ApiError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bizdesk_core::query::Page;
use bizdesk_core::transform::to_external;
use serde::Serialize;
use serde_json::json;

pub(crate) fn ok<T: Serialize>(data: &T) -> Result<Response, ApiError> {
    envelope(StatusCode::OK, data)
}

pub(crate) fn created<T: Serialize>(data: &T) -> Result<Response, ApiError> {
    envelope(StatusCode::CREATED, data)
}

pub(crate) fn page<T: Serialize>(page: &Page<T>) -> Result<Response, ApiError> {
    let body = json!({
        "success": true,
        "data": to_external(&page.items).map_err(ApiError::internal)?,
        "meta": to_external(&page.meta).map_err(ApiError::internal)?,
    });
    Ok((StatusCode::OK, Json(body)).into_response())
}

fn envelope<T: Serialize>(status: StatusCode, data: &T) -> Result<Response, ApiError> {
    let body = json!({
        "success": true,
        "data": to_external(data).map_err(ApiError::internal)?,
    });
    Ok((status, Json(body)).into_response())
}
