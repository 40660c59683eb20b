//! Company repository and its SQLite implementation.

use crate::auth::Scope;
use crate::model::company::Company;
use crate::model::RecordId;
use crate::query::{
    param_text, ListFilter, ListQuery, Page, Params, QueryError, SortDirection, SortSpec,
};
use crate::repo::{
    fetch_active, fetch_page, get_id, row_matches, soft_delete_row, text_value, Conditions,
    RecordRepository, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const COMPANY_COLUMNS: &str =
    "id, name, industry, website, phone, address, created_at, updated_at, deleted_at";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    /// Exact, case-insensitive industry match.
    pub industry: Option<String>,
}

impl ListFilter for CompanyFilter {
    const SORT: SortSpec = SortSpec {
        columns: &["name", "industry", "created_at", "updated_at"],
        default_column: "name",
        default_direction: SortDirection::Asc,
    };

    fn from_params(params: &Params) -> Result<Self, QueryError> {
        Ok(Self {
            industry: param_text(params, "industry"),
        })
    }
}

pub struct SqliteCompanyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompanyRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordRepository<Company> for SqliteCompanyRepository<'_> {
    type Filter = CompanyFilter;

    fn create(&self, company: &Company) -> RepoResult<RecordId> {
        company.validate()?;

        self.conn.execute(
            "INSERT INTO companies (
                id,
                name,
                industry,
                website,
                phone,
                address,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                company.id.to_string(),
                company.name.as_str(),
                company.industry.as_deref(),
                company.website.as_deref(),
                company.phone.as_deref(),
                company.address.as_deref(),
                company.created_at,
                company.updated_at,
            ],
        )?;

        Ok(company.id)
    }

    fn update(&self, company: &Company) -> RepoResult<()> {
        company.validate()?;

        let changed = self.conn.execute(
            "UPDATE companies
             SET
                name = ?1,
                industry = ?2,
                website = ?3,
                phone = ?4,
                address = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?6
               AND deleted_at IS NULL;",
            params![
                company.name.as_str(),
                company.industry.as_deref(),
                company.website.as_deref(),
                company.phone.as_deref(),
                company.address.as_deref(),
                company.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "company",
                id: company.id,
            });
        }
        Ok(())
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Company>> {
        fetch_active(self.conn, "companies", COMPANY_COLUMNS, id, parse_company_row)
    }

    fn list(&self, query: &ListQuery<CompanyFilter>, scope: &Scope) -> RepoResult<Page<Company>> {
        let mut conditions = Conditions::active();
        if let Some(industry) = query.filter.industry.as_deref() {
            conditions.push("industry = ? COLLATE NOCASE", [text_value(industry)]);
        }
        conditions.push_search(&["name", "industry"], query.search.as_deref());
        conditions.push_scope(scope, |_, conditions| conditions.push("0 = 1", []));

        fetch_page(
            self.conn,
            "companies",
            COMPANY_COLUMNS,
            conditions,
            &query.order,
            query.page,
            parse_company_row,
        )
    }

    fn in_scope(&self, id: RecordId, scope: &Scope) -> RepoResult<bool> {
        let mut conditions = Conditions::active();
        conditions.push_scope(scope, |_, conditions| conditions.push("0 = 1", []));
        row_matches(self.conn, "companies", id, conditions)
    }

    fn soft_delete(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, "companies", "company", id)
    }
}

fn parse_company_row(row: &Row<'_>) -> RepoResult<Company> {
    let company = Company {
        id: get_id(row, "id")?,
        name: row.get("name")?,
        industry: row.get("industry")?,
        website: row.get("website")?,
        phone: row.get("phone")?,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    company.validate()?;
    Ok(company)
}
