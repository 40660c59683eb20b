//! Employee repository and its SQLite implementation.
//!
//! Scoped access (`Scope::Own`) resolves to the employee's own row.

use crate::auth::Scope;
use crate::model::employee::{Employee, EmployeeStatus};
use crate::model::RecordId;
use crate::query::{
    param_enum, param_text, ListFilter, ListQuery, Page, Params, QueryError, SortDirection,
    SortSpec,
};
use crate::repo::{
    fetch_active, fetch_page, get_id, id_value, row_matches, soft_delete_row, text_value,
    Conditions, RecordRepository, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

const EMPLOYEE_COLUMNS: &str = "id, first_name, last_name, email, position, department, \
    hire_date, status, created_at, updated_at, deleted_at";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
}

impl ListFilter for EmployeeFilter {
    const SORT: SortSpec = SortSpec {
        columns: &[
            "last_name",
            "first_name",
            "email",
            "department",
            "hire_date",
            "created_at",
        ],
        default_column: "last_name",
        default_direction: SortDirection::Asc,
    };

    fn from_params(params: &Params) -> Result<Self, QueryError> {
        Ok(Self {
            department: param_text(params, "department"),
            status: param_enum(params, "status", EmployeeStatus::parse)?,
        })
    }
}

pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordRepository<Employee> for SqliteEmployeeRepository<'_> {
    type Filter = EmployeeFilter;

    fn create(&self, employee: &Employee) -> RepoResult<RecordId> {
        employee.validate()?;

        self.conn.execute(
            "INSERT INTO employees (
                id,
                first_name,
                last_name,
                email,
                position,
                department,
                hire_date,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                employee.id.to_string(),
                employee.first_name.as_str(),
                employee.last_name.as_str(),
                employee.email.as_str(),
                employee.position.as_deref(),
                employee.department.as_deref(),
                employee.hire_date,
                employee.status,
                employee.created_at,
                employee.updated_at,
            ],
        )?;

        Ok(employee.id)
    }

    fn update(&self, employee: &Employee) -> RepoResult<()> {
        employee.validate()?;

        let changed = self.conn.execute(
            "UPDATE employees
             SET
                first_name = ?1,
                last_name = ?2,
                email = ?3,
                position = ?4,
                department = ?5,
                hire_date = ?6,
                status = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?8
               AND deleted_at IS NULL;",
            params![
                employee.first_name.as_str(),
                employee.last_name.as_str(),
                employee.email.as_str(),
                employee.position.as_deref(),
                employee.department.as_deref(),
                employee.hire_date,
                employee.status,
                employee.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "employee",
                id: employee.id,
            });
        }
        Ok(())
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<Employee>> {
        fetch_active(self.conn, "employees", EMPLOYEE_COLUMNS, id, parse_employee_row)
    }

    fn list(
        &self,
        query: &ListQuery<EmployeeFilter>,
        scope: &Scope,
    ) -> RepoResult<Page<Employee>> {
        let mut conditions = Conditions::active();
        if let Some(department) = query.filter.department.as_deref() {
            conditions.push("department = ? COLLATE NOCASE", [text_value(department)]);
        }
        conditions.push_eq(
            "status",
            query
                .filter
                .status
                .map(|status| Value::Text(status.as_str().to_string())),
        );
        conditions.push_search(
            &["first_name", "last_name", "email"],
            query.search.as_deref(),
        );
        conditions.push_scope(scope, push_own_employee);

        fetch_page(
            self.conn,
            "employees",
            EMPLOYEE_COLUMNS,
            conditions,
            &query.order,
            query.page,
            parse_employee_row,
        )
    }

    fn in_scope(&self, id: RecordId, scope: &Scope) -> RepoResult<bool> {
        let mut conditions = Conditions::active();
        conditions.push_scope(scope, push_own_employee);
        row_matches(self.conn, "employees", id, conditions)
    }

    fn soft_delete(&self, id: RecordId) -> RepoResult<()> {
        soft_delete_row(self.conn, "employees", "employee", id)
    }
}

fn push_own_employee(employee_id: RecordId, conditions: &mut Conditions) {
    conditions.push("id = ?", [id_value(employee_id)]);
}

fn parse_employee_row(row: &Row<'_>) -> RepoResult<Employee> {
    let employee = Employee {
        id: get_id(row, "id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        position: row.get("position")?,
        department: row.get("department")?,
        hire_date: row.get("hire_date")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    employee.validate()?;
    Ok(employee)
}
