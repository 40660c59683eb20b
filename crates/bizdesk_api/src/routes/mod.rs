//! Route handlers, one module per resource.

use crate::ApiError;

pub(crate) mod audit;
pub(crate) mod clients;
pub(crate) mod communications;
pub(crate) mod companies;
pub(crate) mod employees;
pub(crate) mod health;
pub(crate) mod me;
pub(crate) mod milestones;
pub(crate) mod payments;
pub(crate) mod projects;

pub(crate) async fn not_found() -> ApiError {
    ApiError::not_found("no such route")
}
