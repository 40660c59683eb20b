//! HTTP surface for BizDesk.
//!
//! # Responsibility
//! - Map JSON routes onto core services.
//! - Authenticate bearer tokens and translate errors into JSON envelopes.
//!
//! # Invariants
//! - Handlers never panic; every failure becomes an `ApiError` response.
//! - Every mutation and its audit row commit in one SQLite transaction.
//! - External JSON is camelCase; core records stay snake_case.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get};
use axum::Router;
use rusqlite::Connection;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

mod error;
mod extract;
mod logging;
mod respond;
mod routes;

pub use error::ApiError;
pub use extract::{Authenticated, ExternalJson, MemberPath, QueryParams, RecordPath};

/// Request limits applied by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiLimits {
    pub max_body_bytes: usize,
}

impl Default for ApiLimits {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Shared handler state: one serialized SQLite connection.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    pub limits: ApiLimits,
}

impl AppState {
    pub fn new(conn: Connection, limits: ApiLimits) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            limits,
        }
    }

    /// Runs `f` against the connection outside any explicit transaction.
    pub async fn read<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let conn = self.db.lock().await;
        f(&conn)
    }

    /// Runs `f` inside a transaction; commits only when `f` succeeds.
    pub async fn write<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut conn = self.db.lock().await;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/me", get(routes::me::me))
        .route(
            "/client",
            get(routes::clients::list).post(routes::clients::create),
        )
        .route(
            "/client/:id",
            get(routes::clients::get)
                .patch(routes::clients::update)
                .delete(routes::clients::delete),
        )
        .route(
            "/company",
            get(routes::companies::list).post(routes::companies::create),
        )
        .route(
            "/company/:id",
            get(routes::companies::get)
                .patch(routes::companies::update)
                .delete(routes::companies::delete),
        )
        .route(
            "/project",
            get(routes::projects::list).post(routes::projects::create),
        )
        .route(
            "/project/:id",
            get(routes::projects::get)
                .patch(routes::projects::update)
                .delete(routes::projects::delete),
        )
        .route(
            "/project/:id/members",
            get(routes::projects::list_members).post(routes::projects::add_member),
        )
        .route(
            "/project/:id/members/:employee_id",
            delete(routes::projects::remove_member),
        )
        .route(
            "/milestone",
            get(routes::milestones::list).post(routes::milestones::create),
        )
        .route(
            "/milestone/:id",
            get(routes::milestones::get)
                .patch(routes::milestones::update)
                .delete(routes::milestones::delete),
        )
        .route(
            "/employee",
            get(routes::employees::list).post(routes::employees::create),
        )
        .route(
            "/employee/:id",
            get(routes::employees::get)
                .patch(routes::employees::update)
                .delete(routes::employees::delete),
        )
        .route(
            "/payment",
            get(routes::payments::list).post(routes::payments::create),
        )
        .route(
            "/payment/:id",
            get(routes::payments::get)
                .patch(routes::payments::update)
                .delete(routes::payments::delete),
        )
        .route(
            "/communication",
            get(routes::communications::list).post(routes::communications::create),
        )
        .route(
            "/communication/:id",
            get(routes::communications::get)
                .patch(routes::communications::update)
                .delete(routes::communications::delete),
        )
        .route("/audit", get(routes::audit::list));

    Router::new()
        .nest("/api", api)
        .fallback(routes::not_found)
        .layer(middleware::from_fn(logging::log_requests))
        .layer(DefaultBodyLimit::max(state.limits.max_body_bytes))
        .with_state(state)
}

/// Serves the API on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("event=http_listen module=api status=ok addr={addr}");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("event=http_shutdown module=api status=ok"),
        Err(err) => {
            log::warn!("event=http_shutdown module=api status=error error={err}");
            std::future::pending::<()>().await;
        }
    }
}
