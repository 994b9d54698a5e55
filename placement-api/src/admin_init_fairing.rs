use diesel::prelude::*;
use dotenvy::dotenv;
use rocket::Rocket;
use rocket::fairing::AdHoc;

use crate::models::{User, UserInput};
use crate::orm::DbConn;
use crate::orm::user::{get_user_by_email, insert_user};
use crate::permissions::Role;

/// Add the default developer account if needed.
///
/// Set the default email/pass with the envars PLACEMENT_DEFAULT_EMAIL and
/// PLACEMENT_DEFAULT_PASSWORD.
pub fn admin_init_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Admin User Initialization", |rocket| async {
        dotenv().ok();

        let conn = match get_db_connection(&rocket).await {
            Some(conn) => conn,
            None => return Err(rocket),
        };

        let admin_email = get_admin_email();
        let admin_password = get_admin_password();
        let result = conn
            .run(move |c| create_admin_user_if_needed(c, &admin_email, &admin_password))
            .await;

        match result {
            Ok(()) => Ok(rocket),
            Err(e) => {
                error!("[admin-init] FATAL: Admin user creation failed: {:?}", e);
                Err(rocket)
            }
        }
    })
}

async fn get_db_connection(rocket: &Rocket<rocket::Build>) -> Option<DbConn> {
    match DbConn::get_one(rocket).await {
        Some(conn) => Some(conn),
        None => {
            error!("[admin-init] ERROR: Could not get DB connection.");
            None
        }
    }
}

fn get_admin_email() -> String {
    std::env::var("PLACEMENT_DEFAULT_EMAIL")
        .unwrap_or_else(|_| "developer@example.com".to_string())
}

fn get_admin_password() -> String {
    std::env::var("PLACEMENT_DEFAULT_PASSWORD").unwrap_or_else(|_| "admin".to_string())
}

fn create_admin_user_if_needed(
    c: &mut SqliteConnection,
    admin_email: &str,
    admin_password: &str,
) -> Result<(), diesel::result::Error> {
    if get_user_by_email(c, admin_email)?.is_some() {
        info!("[admin-init] Admin user '{}' already exists", admin_email);
        return Ok(());
    }

    create_admin_user(c, admin_email, admin_password).map(|_| ())
}

fn create_admin_user(
    c: &mut SqliteConnection,
    admin_email: &str,
    admin_password: &str,
) -> Result<User, diesel::result::Error> {
    let admin_user = UserInput {
        email: admin_email.to_string(),
        full_name: "System Developer".to_string(),
        password: admin_password.to_string(),
        role: Role::Developer.as_str().to_string(),
    };

    match insert_user(c, admin_user) {
        Ok(user) => {
            info!("[admin-init] Created developer user: '{}'", admin_email);
            Ok(user)
        }
        Err(e) => {
            error!("[admin-init] ERROR creating developer user: {:?}", e);
            Err(e)
        }
    }
}
