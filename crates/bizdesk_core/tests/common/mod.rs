#![allow(dead_code)]

use bizdesk_core::auth::Principal;
use bizdesk_core::model::client::{Client, NewClient};
use bizdesk_core::model::employee::{Employee, NewEmployee};
use bizdesk_core::model::project::{NewProject, Project};
use bizdesk_core::model::user::{NewUser, Role};
use bizdesk_core::model::RecordId;
use bizdesk_core::repo::audit_repo::SqliteAuditRepository;
use bizdesk_core::repo::client_repo::SqliteClientRepository;
use bizdesk_core::repo::employee_repo::SqliteEmployeeRepository;
use bizdesk_core::repo::project_repo::SqliteProjectRepository;
use bizdesk_core::repo::user_repo::SqliteUserRepository;
use bizdesk_core::repo::RecordRepository;
use bizdesk_core::service::AuthService;
use rusqlite::Connection;

pub fn user(conn: &Connection, email: &str, role: Role, employee_id: Option<RecordId>) -> Principal {
    let auth = AuthService::new(SqliteUserRepository::new(conn), SqliteAuditRepository::new(conn));
    let user = auth
        .create_user(
            None,
            NewUser {
                email: email.to_string(),
                display_name: email.to_string(),
                role,
                employee_id,
            },
        )
        .unwrap();
    Principal::new(user.id, user.role, user.employee_id)
}

pub fn admin(conn: &Connection) -> Principal {
    user(conn, "admin@bizdesk.test", Role::Admin, None)
}

pub fn employee(conn: &Connection, first_name: &str) -> Employee {
    let employee = Employee::from_new(NewEmployee {
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        email: format!("{}@bizdesk.test", first_name.to_lowercase()),
        ..NewEmployee::default()
    });
    SqliteEmployeeRepository::new(conn).create(&employee).unwrap();
    employee
}

pub fn client(conn: &Connection, name: &str) -> Client {
    let client = Client::from_new(NewClient {
        name: name.to_string(),
        ..NewClient::default()
    });
    SqliteClientRepository::new(conn).create(&client).unwrap();
    client
}

pub fn project(
    conn: &Connection,
    client_id: RecordId,
    name: &str,
    manager_id: Option<RecordId>,
) -> Project {
    let project = Project::from_new(NewProject {
        client_id,
        manager_id,
        name: name.to_string(),
        description: None,
        status: Default::default(),
        budget_cents: None,
        start_date: None,
        end_date: None,
    });
    SqliteProjectRepository::new(conn).create(&project).unwrap();
    project
}
