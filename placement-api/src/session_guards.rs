//! Authentication and permission guards for Rocket routes.
//!
//! A request authenticates with a bearer token, either in an
//! `Authorization: Bearer <token>` header or in the `session` cookie set at
//! login. The header wins when both are present.
//!
//! # Basic Authentication
//!
//! ```rust
//! use rocket::get;
//! use placement_api::session_guards::AuthenticatedUser;
//!
//! #[get("/profile")]
//! fn get_profile(user: AuthenticatedUser) -> String {
//!     format!("Welcome, {} ({})", user.user.email, user.role)
//! }
//! ```
//!
//! # Permission Guards
//!
//! Each guard below admits users whose role grants one permission. An
//! unauthenticated request fails with 401; an authenticated one without the
//! permission fails with 403.
//!
//! ```rust
//! use rocket::get;
//! use placement_api::session_guards::AnalyticsViewer;
//!
//! #[get("/numbers")]
//! fn numbers(viewer: AnalyticsViewer) -> String {
//!     format!("Analytics for {}", viewer.user.email)
//! }
//! ```

use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};

use crate::DbConn;
use crate::models::User;
use crate::orm::login::find_user_by_token;
use crate::permissions::{Permission, Role};

/// Name of the cookie carrying the bearer token for browser clients.
pub const SESSION_COOKIE: &str = "session";

/// Extracts the bearer token from the request, header first, then cookie.
pub fn request_token(request: &Request<'_>) -> Option<String> {
    if let Some(header) = request.headers().get_one("Authorization") {
        let mut parts = header.trim().splitn(2, ' ');
        let scheme = parts.next().unwrap_or_default();
        let token = parts.next().map(str::trim).unwrap_or_default();
        if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            return Some(token.to_string());
        }
        return None;
    }
    request
        .cookies()
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// A request guard for routes that require an authenticated user.
///
/// # Returns
///
/// - `Outcome::Success(AuthenticatedUser)` if the token resolves to a user
///   with a known role
/// - `Outcome::Error(Status::Unauthorized)` if the token is missing, unknown,
///   revoked or expired
/// - `Outcome::Error(Status::InternalServerError)` if the database cannot be
///   reached
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user: User,
    pub role: Role,
    /// The token the request authenticated with.
    pub token: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let token = match request_token(request) {
            Some(token) => token,
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        let db = match request.guard::<DbConn>().await {
            Outcome::Success(db) => db,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        let user = match find_user_by_token(&db, &token).await {
            Ok(Some(user)) => user,
            Ok(None) => return Outcome::Error((Status::Unauthorized, ())),
            Err(e) => {
                error!("Database error resolving bearer token: {:?}", e);
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        let role = match user.role.parse::<Role>() {
            Ok(role) => role,
            Err(e) => {
                warn!("User {} has an unusable role: {}", user.id, e);
                return Outcome::Error((Status::Unauthorized, ()));
            }
        };

        Outcome::Success(AuthenticatedUser { user, role, token })
    }
}

impl AuthenticatedUser {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.can(permission)
    }

    pub fn permissions(&self) -> &'static [Permission] {
        self.role.permissions()
    }
}

/// Macro to create permission-specific request guards
macro_rules! create_permission_guard {
    ($name:ident, $permission:expr) => {
        #[derive(Debug)]
        pub struct $name {
            pub user: User,
            pub role: Role,
        }

        #[rocket::async_trait]
        impl<'r> FromRequest<'r> for $name {
            type Error = ();

            async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
                let auth_user = match AuthenticatedUser::from_request(request).await {
                    Outcome::Success(user) => user,
                    Outcome::Error(e) => return Outcome::Error(e),
                    Outcome::Forward(f) => return Outcome::Forward(f),
                };

                if auth_user.has_permission($permission) {
                    Outcome::Success($name {
                        user: auth_user.user,
                        role: auth_user.role,
                    })
                } else {
                    warn!(
                        "{} ({}) denied {:?} on {}",
                        auth_user.user.email,
                        auth_user.role,
                        $permission,
                        request.uri().path()
                    );
                    Outcome::Error((Status::Forbidden, ()))
                }
            }
        }
    };
}

create_permission_guard!(DashboardViewer, Permission::ViewDashboard);
create_permission_guard!(StudentViewer, Permission::ViewStudents);
create_permission_guard!(StudentManager, Permission::ManageStudents);
create_permission_guard!(StudentDeleter, Permission::DeleteStudents);
create_permission_guard!(CompanyViewer, Permission::ViewCompanies);
create_permission_guard!(CompanyManager, Permission::ManageCompanies);
create_permission_guard!(PlacementViewer, Permission::ViewPlacements);
create_permission_guard!(PlacementManager, Permission::ManagePlacements);
create_permission_guard!(AnalyticsViewer, Permission::ViewAnalytics);
create_permission_guard!(UserManager, Permission::ManageUsers);
