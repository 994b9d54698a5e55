//! Test scaffolding: in-memory databases, a fully wired test Rocket and
//! small fixture builders shared by unit and integration tests.

use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::sqlite::SqliteConnection;
use rocket::figment::{
    util::map,
    value::{Map, Value},
};
use rocket::{Build, Rocket, fairing::AdHoc};
use rocket_sync_db_pools::diesel;

use super::db::{DbConn, run_pending_migrations, set_foreign_keys};
use crate::admin_init_fairing::admin_init_fairing;
use crate::models::{CompanyInput, PlacementInput, StudentInput, UserInput};
use crate::orm::user::{get_user_by_email, insert_user};
use crate::permissions::Role;

/// Password shared by every seeded test account.
pub const TEST_PASSWORD: &str = "admin";

/// Seeded accounts, one per role.
pub const TEST_USERS: [(&str, Role); 4] = [
    ("developer@example.com", Role::Developer),
    ("owner@example.com", Role::Owner),
    ("admin@example.com", Role::Admin),
    ("teacher@example.com", Role::Teacher),
];

/// Configures SQLite with performance-optimized settings for testing.
///
/// These settings make SQLite faster but less durable - only use for testing.
///
/// # Panics
/// Panics if the PRAGMA commands fail to execute
fn set_sqlite_test_pragmas(conn: &mut diesel::SqliteConnection) {
    conn.batch_execute(
        r#"
        PRAGMA synchronous = OFF;
        PRAGMA journal_mode = OFF;
        "#,
    )
    .expect("Failed to set SQLite PRAGMAs");
}

fn set_sqlite_test_pragmas_fairing() -> AdHoc {
    AdHoc::on_ignite("Set SQLite Test Pragmas", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for test pragmas");
        conn.run(|c| {
            set_sqlite_test_pragmas(c);
        })
        .await;
        rocket
    })
}

/// Creates one account per role so tests can log in as any of them.
fn test_data_init_fairing() -> AdHoc {
    AdHoc::on_ignite("Test Data Initialization", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for test data initialization");

        conn.run(|c| {
            if let Err(e) = create_test_users(c) {
                error!("[test-data-init] ERROR: Failed to create test data: {:?}", e);
            }
        })
        .await;

        rocket
    })
}

fn create_test_users(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    for (email, role) in TEST_USERS {
        if get_user_by_email(conn, email)?.is_some() {
            continue;
        }
        insert_user(
            conn,
            UserInput {
                email: email.to_string(),
                full_name: format!("Test {}", role),
                password: TEST_PASSWORD.to_string(),
                role: role.as_str().to_string(),
            },
        )?;
    }
    Ok(())
}

/// Creates and configures a Rocket instance for testing with an in-memory SQLite database.
///
/// The returned Rocket instance will have:
/// - A unique shared-cache in-memory database, so the batch executor can
///   hold several pooled connections to the same data
/// - Foreign keys enabled and testing pragmas set
/// - All migrations run
/// - The default developer plus one seeded account per role
/// - API routes mounted
pub fn test_rocket() -> Rocket<Build> {
    use uuid::Uuid;

    let unique_db_name = format!("file:test_db_{}?mode=memory&cache=shared", Uuid::new_v4());

    let db_config: Map<_, Value> = map! {
        "url" => unique_db_name.into(),
        "pool_size" => 5.into(),
        "timeout" => 5.into(),
    };

    let figment = rocket::Config::figment().merge(("databases", map!["sqlite_db" => db_config]));

    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(super::db::set_foreign_keys_fairing())
        .attach(set_sqlite_test_pragmas_fairing())
        .attach(super::db::run_migrations_fairing())
        .attach(admin_init_fairing())
        .attach(test_data_init_fairing())
        .register("/", crate::catchers());

    crate::mount_api_routes(rocket)
}

/// Creates a synchronous in-memory SQLite database connection for unit tests.
///
/// Each call to this function returns a new, independent in-memory database
/// with migrations applied and foreign keys on.
pub fn setup_test_db() -> SqliteConnection {
    use diesel::Connection;

    let mut conn = SqliteConnection::establish(":memory:")
        .expect("Failed to create in-memory SQLite database");
    set_foreign_keys(&mut conn);
    run_pending_migrations(&mut conn);
    conn
}

/// A minimal async-compatible wrapper for a synchronous SQLite connection for unit testing.
///
/// Code written against the `.run()` interface of a pooled connection can be
/// driven with this wrapper over a connection from `setup_test_db()`.
pub struct FakeDbConn<'a>(pub &'a mut diesel::SqliteConnection);

impl<'a> FakeDbConn<'a> {
    /// Executes a closure with a mutable reference to the underlying SQLite connection.
    ///
    /// # Safety
    /// Converts the shared borrow back to a mutable one. Sound only because the
    /// closure runs to completion before returning and tests never share the
    /// wrapper across threads.
    pub async fn run<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        unsafe {
            let conn_ptr =
                self.0 as *const diesel::SqliteConnection as *mut diesel::SqliteConnection;
            f(&mut *conn_ptr)
        }
    }
}

/// Creates a `FakeDbConn` for async-style testing with the given SQLite connection.
pub fn setup_test_dbconn<'a>(conn: &'a mut diesel::SqliteConnection) -> FakeDbConn<'a> {
    FakeDbConn(conn)
}

/// A registration with plausible defaults.
pub fn sample_student(full_name: &str, district: &str) -> StudentInput {
    StudentInput {
        full_name: full_name.to_string(),
        nic: None,
        district: district.to_string(),
        province: "Central".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2000, 5, 17),
        sex: "female".to_string(),
        marital_status: "single".to_string(),
        phone: None,
        email: None,
        address: None,
        has_ol: true,
        has_al: false,
    }
}

/// A partner company with plausible defaults.
pub fn sample_company(name: &str, country: &str) -> CompanyInput {
    CompanyInput {
        name: name.to_string(),
        country: country.to_string(),
        industry: Some("Manufacturing".to_string()),
        contact_person: None,
        email: None,
        phone: None,
        address: None,
    }
}

/// A placement starting on 2025-04-01.
pub fn sample_placement(student_id: i32, company_id: i32) -> PlacementInput {
    PlacementInput {
        student_id,
        company_id,
        position: "Machine Operator".to_string(),
        salary: Some(150000.0),
        start_date: NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date"),
        end_date: None,
        contract_duration_months: Some(36),
        visa_type: Some("Specified Skilled Worker".to_string()),
    }
}
