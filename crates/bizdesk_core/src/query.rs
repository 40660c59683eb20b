//! Pagination, ordering and list-filter parsing.
//!
//! # Responsibility
//! - Turn raw query-string parameters into validated list queries.
//! - Render `ORDER BY` clauses from a per-entity column allowlist.
//!
//! # Invariants
//! - Sort columns are always taken from a static allowlist, never from input.
//! - Page size is clamped to `1..=MAX_PAGE_SIZE`.
//! - Rendered order clauses end with an `id` tie-breaker so pages are stable.

use crate::model::RecordId;
use crate::transform::{to_camel_case, to_snake_case};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Raw query-string parameters as received from the HTTP layer.
pub type Params = BTreeMap<String, String>;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid value `{value}` for query parameter `{name}`")]
    InvalidParameter { name: String, value: String },
    #[error("cannot sort by `{0}`")]
    UnsupportedSortField(String),
}

/// Requested page window. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Builds a page request, normalizing the size the same way as parsing does.
    pub fn new(page: u32, page_size: Option<u32>) -> Self {
        Self {
            page: page.max(1),
            page_size: normalize_page_size(page_size),
        }
    }

    /// Parses `page` plus `pageSize` (or `limit`) from raw parameters.
    pub fn from_params(params: &Params) -> Result<Self, QueryError> {
        let page = match param(params, "page") {
            Some(raw) => match parse_u32("page", raw)? {
                0 => {
                    return Err(QueryError::InvalidParameter {
                        name: "page".to_string(),
                        value: raw.to_string(),
                    })
                }
                value => value,
            },
            None => 1,
        };

        let page_size = match param(params, "page_size").or_else(|| param(params, "limit")) {
            Some(raw) => Some(parse_u32("pageSize", raw)?),
            None => None,
        };

        Ok(Self::new(page, page_size))
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

/// Normalizes requested page size: `0`/absent → default, larger than max → max.
pub fn normalize_page_size(page_size: Option<u32>) -> u32 {
    match page_size {
        Some(0) | None => DEFAULT_PAGE_SIZE,
        Some(value) if value > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
        Some(value) => value,
    }
}

/// Pagination metadata returned next to list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
}

impl PageMeta {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let page_size = u64::from(request.page_size.max(1));
        let total_pages = total.div_ceil(page_size);
        Self {
            page: request.page,
            page_size: request.page_size,
            total,
            total_pages,
            has_next: u64::from(request.page) < total_pages,
        }
    }
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Sortable columns of one entity plus its default ordering.
#[derive(Debug, Clone, Copy)]
pub struct SortSpec {
    pub columns: &'static [&'static str],
    pub default_column: &'static str,
    pub default_direction: SortDirection,
}

/// Validated ordering. `column` always comes from a `SortSpec` allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn default_for(allowed: &SortSpec) -> Self {
        Self {
            column: allowed.default_column,
            direction: allowed.default_direction,
        }
    }

    /// Parses `orderBy` + `order`, or the `sort=-field` shorthand.
    pub fn from_params(params: &Params, allowed: &SortSpec) -> Result<Self, QueryError> {
        let (field, direction) = match params.get("sort").map(|value| value.trim()) {
            Some(sort) if !sort.is_empty() => match sort.strip_prefix('-') {
                Some(field) => (Some(field), Some(SortDirection::Desc)),
                None => (
                    Some(sort.strip_prefix('+').unwrap_or(sort)),
                    Some(SortDirection::Asc),
                ),
            },
            _ => {
                let direction = match param(params, "order").or_else(|| param(params, "direction")) {
                    Some(raw) => Some(SortDirection::parse(raw).ok_or_else(|| {
                        QueryError::InvalidParameter {
                            name: "order".to_string(),
                            value: raw.to_string(),
                        }
                    })?),
                    None => None,
                };
                (param(params, "order_by"), direction)
            }
        };

        let column = match field.map(str::trim).filter(|field| !field.is_empty()) {
            Some(field) => {
                let wanted = to_snake_case(field);
                allowed.columns
                    .iter()
                    .copied()
                    .find(|column| *column == wanted)
                    .ok_or_else(|| QueryError::UnsupportedSortField(field.to_string()))?
            }
            None => allowed.default_column,
        };

        Ok(Self {
            column,
            direction: direction.unwrap_or(allowed.default_direction),
        })
    }

    /// Renders the `ORDER BY` clause, with an `id` tie-breaker.
    pub fn to_sql(&self) -> String {
        if self.column == "id" {
            format!("ORDER BY id {}", self.direction.as_sql())
        } else {
            format!(
                "ORDER BY {} {}, id ASC",
                self.column,
                self.direction.as_sql()
            )
        }
    }
}

/// Entity-specific list filter parsed from query parameters.
pub trait ListFilter: Default + Sized {
    /// Sortable columns and default ordering for the entity.
    const SORT: SortSpec;

    fn from_params(params: &Params) -> Result<Self, QueryError>;
}

/// Complete list request for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery<F> {
    pub page: PageRequest,
    pub order: OrderBy,
    /// Case-insensitive substring search over entity-specific text columns.
    pub search: Option<String>,
    pub filter: F,
}

impl<F: ListFilter> Default for ListQuery<F> {
    fn default() -> Self {
        Self {
            page: PageRequest::default(),
            order: OrderBy::default_for(&F::SORT),
            search: None,
            filter: F::default(),
        }
    }
}

impl<F: ListFilter> ListQuery<F> {
    pub fn from_params(params: &Params) -> Result<Self, QueryError> {
        Ok(Self {
            page: PageRequest::from_params(params)?,
            order: OrderBy::from_params(params, &F::SORT)?,
            search: param(params, "search")
                .or_else(|| param(params, "q"))
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_string),
            filter: F::from_params(params)?,
        })
    }
}

/// Looks a parameter up by its snake_case name or camelCase equivalent.
pub fn param<'p>(params: &'p Params, snake_name: &str) -> Option<&'p str> {
    params
        .get(snake_name)
        .or_else(|| params.get(&to_camel_case(snake_name)))
        .map(String::as_str)
}

/// Parses an optional UUID filter parameter.
pub fn param_id(params: &Params, snake_name: &str) -> Result<Option<RecordId>, QueryError> {
    match param(params, snake_name) {
        Some(raw) => Uuid::parse_str(raw.trim())
            .map(Some)
            .map_err(|_| QueryError::InvalidParameter {
                name: to_camel_case(snake_name),
                value: raw.to_string(),
            }),
        None => Ok(None),
    }
}

/// Parses an optional enum filter parameter through the enum's wire parser.
pub fn param_enum<E>(
    params: &Params,
    snake_name: &str,
    parse: impl Fn(&str) -> Option<E>,
) -> Result<Option<E>, QueryError> {
    match param(params, snake_name) {
        Some(raw) => parse(raw.trim())
            .map(Some)
            .ok_or_else(|| QueryError::InvalidParameter {
                name: to_camel_case(snake_name),
                value: raw.to_string(),
            }),
        None => Ok(None),
    }
}

/// Parses an optional free-text filter parameter; blank values are ignored.
pub fn param_text(params: &Params, snake_name: &str) -> Option<String> {
    param(params, snake_name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_u32(name: &str, raw: &str) -> Result<u32, QueryError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| QueryError::InvalidParameter {
            name: name.to_string(),
            value: raw.to_string(),
        })
}
