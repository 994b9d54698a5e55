//! API endpoints for logging in and out.
//!
//! A successful login returns a bearer token in the body and mirrors it in
//! the `session` cookie. Either may be presented on later requests.

use rocket::Route;
use rocket::http::{Cookie, CookieJar, Status};
use rocket::serde::json::{Json, Value, json};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{ApiError, api_error};
use crate::DbConn;
use crate::models::User;
use crate::orm::login::process_login;
use crate::orm::logout::revoke_session;
use crate::permissions::{Permission, Role};
use crate::session_guards::{AuthenticatedUser, SESSION_COOKIE};

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, TS)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub permissions: Vec<Permission>,
}

/// The caller's account and what it may do.
#[derive(Serialize, TS)]
#[ts(export)]
pub struct CurrentUser {
    pub user: User,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// Login endpoint.
///
/// - **URL:** `/api/1/login`
/// - **Method:** `POST`
/// - **Purpose:** Exchanges email and password for a bearer token
/// - **Authentication:** None required
///
/// # Request Format
///
/// ```json
/// { "email": "admin@example.com", "password": "secret" }
/// ```
///
/// # Response
///
/// **Success (HTTP 200 OK):** `{ "token": "...", "user": {...}, "permissions": [...] }`
///
/// **Failure:** 400 when either field is blank, 401 on bad credentials.
#[post("/1/login", data = "<login>")]
pub async fn login(
    db: DbConn,
    cookies: &CookieJar<'_>,
    login: Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    match process_login(&db, cookies, &login).await {
        Ok((token, user)) => {
            info!("User {} logged in", user.email);
            let permissions = user
                .role
                .parse::<Role>()
                .map(|role| role.permissions().to_vec())
                .unwrap_or_default();
            Ok(Json(LoginResponse {
                token,
                user,
                permissions,
            }))
        }
        Err(status) if status == Status::BadRequest => Err(api_error(
            Status::BadRequest,
            "Email and password are required",
        )),
        Err(status) if status == Status::Unauthorized => {
            warn!("Failed login attempt for {}", login.email.trim());
            Err(api_error(Status::Unauthorized, "Invalid credentials"))
        }
        Err(status) => Err(api_error(status, "Login failed")),
    }
}

/// Logout endpoint.
///
/// - **URL:** `/api/1/logout`
/// - **Method:** `POST`
/// - **Purpose:** Revokes the token the request authenticated with and
///   clears the session cookie
/// - **Authentication:** Required
#[post("/1/logout")]
pub async fn logout(
    db: DbConn,
    cookies: &CookieJar<'_>,
    auth_user: AuthenticatedUser,
) -> Result<Json<Value>, ApiError> {
    revoke_session(&db, &auth_user.token)
        .await
        .map_err(|e| super::internal_error("Error revoking session", e))?;
    cookies.remove(Cookie::from(SESSION_COOKIE));

    Ok(Json(json!({
        "message": "Logout successful",
        "status": "ok"
    })))
}

/// Current user endpoint.
///
/// - **URL:** `/api/1/me`
/// - **Method:** `GET`
/// - **Purpose:** Returns the authenticated account, its role and its
///   permissions
/// - **Authentication:** Required
#[get("/1/me")]
pub fn me(auth_user: AuthenticatedUser) -> Json<CurrentUser> {
    let permissions = auth_user.permissions().to_vec();
    Json(CurrentUser {
        role: auth_user.role,
        user: auth_user.user,
        permissions,
    })
}

pub fn routes() -> Vec<Route> {
    routes![login, logout, me]
}
