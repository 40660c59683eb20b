//! Core domain logic for BizDesk.
//! This crate is the single source of truth for business invariants and
//! access rules; the HTTP and CLI crates are thin adapters over it.

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;
pub mod transform;

pub use auth::{authorize, AccessError, Action, Principal, Resource, Scope};
pub use config::{BizConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{RecordId, ValidationError};
pub use query::{ListFilter, ListQuery, Page, PageMeta, PageRequest, Params, QueryError};
pub use repo::{RecordRepository, RepoError, RepoResult};
pub use service::{ServiceError, ServiceResult};
pub use transform::{from_external, keys_to_camel, keys_to_snake, to_external};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
