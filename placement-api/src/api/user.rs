//! API endpoints for operator accounts. Only roles with `manage_users`
//! reach any of them.

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;

use super::{ApiError, api_error, internal_error};
use crate::models::{User, UserInput};
use crate::orm::DbConn;
use crate::orm::user::{delete_user, get_user_by_email, insert_user, list_all_users};
use crate::permissions::Role;
use crate::session_guards::UserManager;

fn validate_input(input: &UserInput) -> Result<(), ApiError> {
    let email = input.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(api_error(Status::BadRequest, "A valid email is required"));
    }
    if input.password.is_empty() {
        return Err(api_error(Status::BadRequest, "password is required"));
    }
    if input.full_name.trim().is_empty() {
        return Err(api_error(Status::BadRequest, "full_name is required"));
    }
    input
        .role
        .parse::<Role>()
        .map(|_| ())
        .map_err(|e| api_error(Status::BadRequest, e))
}

/// Create User endpoint.
///
/// - **URL:** `/api/1/Users`
/// - **Method:** `POST`
/// - **Purpose:** Creates an operator account
/// - **Authentication:** Required, `manage_users`
///
/// # Request Format
///
/// ```json
/// {
///   "email": "teacher@example.com",
///   "full_name": "Kamala Silva",
///   "password": "secret",
///   "role": "teacher"
/// }
/// ```
///
/// **Failure:** 400 on an invalid email or unknown role, 409 when the email
/// is taken.
#[post("/1/Users", data = "<new_user>")]
pub async fn create_user(
    db: DbConn,
    new_user: Json<UserInput>,
    manager: UserManager,
) -> Result<status::Created<Json<User>>, ApiError> {
    let new_user = new_user.into_inner();
    validate_input(&new_user)?;

    let created = db
        .run(move |conn| {
            match get_user_by_email(conn, &new_user.email) {
                Ok(Some(_)) => {
                    return Err(api_error(
                        Status::Conflict,
                        format!("User with email '{}' already exists", new_user.email.trim()),
                    ));
                }
                Ok(None) => {}
                Err(e) => return Err(internal_error("Error checking for existing user", e)),
            }
            insert_user(conn, new_user).map_err(|e| internal_error("Error creating user", e))
        })
        .await?;

    info!(
        "{} created {} account {}",
        manager.user.email, created.role, created.email
    );
    Ok(status::Created::new(format!("/api/1/Users/{}", created.id)).body(Json(created)))
}

/// List Users endpoint.
///
/// - **URL:** `/api/1/Users`
/// - **Method:** `GET`
/// - **Authentication:** Required, `manage_users`
#[get("/1/Users")]
pub async fn list_users(db: DbConn, _manager: UserManager) -> Result<Json<Vec<User>>, ApiError> {
    db.run(list_all_users)
        .await
        .map(Json)
        .map_err(|e| internal_error("Error listing users", e))
}

/// Delete User endpoint.
///
/// - **URL:** `/api/1/Users/<user_id>`
/// - **Method:** `DELETE`
/// - **Authentication:** Required, `manage_users`
///
/// **Failure:** 404 for an unknown user, 409 when deleting one's own
/// account.
#[delete("/1/Users/<user_id>")]
pub async fn delete_user_endpoint(
    db: DbConn,
    user_id: i32,
    manager: UserManager,
) -> Result<status::NoContent, ApiError> {
    if manager.user.id == user_id {
        return Err(api_error(Status::Conflict, "Cannot delete your own account"));
    }
    match db.run(move |conn| delete_user(conn, user_id)).await {
        Ok(true) => {
            info!("{} deleted user {}", manager.user.email, user_id);
            Ok(status::NoContent)
        }
        Ok(false) => Err(api_error(Status::NotFound, "User not found")),
        Err(e) => Err(internal_error("Error deleting user", e)),
    }
}

pub fn routes() -> Vec<Route> {
    routes![create_user, list_users, delete_user_endpoint]
}
