use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

/// Emits one `event=http_request` line per request.
pub(crate) async fn log_requests(req: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let response = next.run(req).await;

    let status = response.status();
    let duration_ms = started_at.elapsed().as_millis();
    if status.is_server_error() {
        log::error!(
            "event=http_request module=api status={} method={} route={} duration_ms={}",
            status.as_u16(),
            method,
            route,
            duration_ms
        );
    } else {
        log::info!(
            "event=http_request module=api status={} method={} route={} duration_ms={}",
            status.as_u16(),
            method,
            route,
            duration_ms
        );
    }
    response
}
