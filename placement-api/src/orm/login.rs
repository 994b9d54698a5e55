//! Database operations for login and bearer token management.
//!
//! Tokens are opaque UUID strings stored in the `sessions` table. A token is
//! valid while its row exists, is not revoked and has not expired.

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use diesel::prelude::*;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use uuid::Uuid;

use crate::DbConn;
use crate::models::{NewSession, Session, User};
use crate::orm::testing::FakeDbConn;
use crate::schema::{sessions, users};
use crate::session_guards::SESSION_COOKIE;

/// Trait for abstracting database operations to support both production and testing.
///
/// This trait allows the same functions to work with both `DbConn` (production)
/// and `FakeDbConn` (testing) by providing a unified interface for database operations.
pub trait DbRunner {
    /// Executes a database operation with a connection.
    fn run<F, R>(&self, f: F) -> impl std::future::Future<Output = R>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static;
}

impl DbRunner for DbConn {
    fn run<F, R>(&self, f: F) -> impl std::future::Future<Output = R>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        DbConn::run(self, f)
    }
}

impl<'a> DbRunner for FakeDbConn<'a> {
    fn run<F, R>(&self, f: F) -> impl std::future::Future<Output = R>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        FakeDbConn::run(self, f)
    }
}

/// Generates a new UUID-based bearer token.
fn generate_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// Finds a user by their email address.
///
/// # Returns
/// * `Ok(Some(User))` - User found with matching email
/// * `Ok(None)` - No user found with that email
/// * `Err(Status::InternalServerError)` - Database query failed
pub async fn find_user_by_email<D: DbRunner>(db: &D, email: &str) -> Result<Option<User>, Status> {
    let email = email.trim().to_lowercase();
    db.run(move |conn| {
        users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first::<User>(conn)
            .optional()
    })
    .await
    .map_err(|_| Status::InternalServerError)
}

/// Resolves a bearer token to the user that owns it.
///
/// Revoked and expired tokens resolve to `None`, exactly like unknown ones.
pub async fn find_user_by_token<D: DbRunner>(
    db: &D,
    token: &str,
) -> Result<Option<User>, diesel::result::Error> {
    let token = token.to_string();
    db.run(move |conn| {
        let session = sessions::table
            .filter(sessions::id.eq(&token))
            .filter(sessions::revoked.eq(false))
            .filter(
                sessions::expires_at
                    .is_null()
                    .or(sessions::expires_at.gt(Utc::now().naive_utc())),
            )
            .first::<Session>(conn)
            .optional()?;

        match session {
            Some(session) => users::table
                .filter(users::id.eq(session.user_id))
                .select(User::as_select())
                .first::<User>(conn)
                .optional(),
            None => Ok(None),
        }
    })
    .await
}

/// Verifies a password against a stored Argon2 hash.
///
/// A stored hash that cannot be parsed never verifies.
fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(e) => {
            error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Creates a new session and stores it in the database.
///
/// # Returns
/// * `Ok(String)` - Bearer token that was created and stored
/// * `Err(Status::InternalServerError)` - Database insertion failed
pub async fn create_and_store_session<D: DbRunner>(db: &D, user_id: i32) -> Result<String, Status> {
    let session_token = generate_session_token();
    let now = Utc::now().naive_utc();

    let new_session = NewSession {
        id: session_token.clone(),
        user_id,
        created_at: now,
        expires_at: None,
        revoked: false,
    };

    db.run(move |conn| {
        diesel::insert_into(sessions::table)
            .values(&new_session)
            .execute(conn)
    })
    .await
    .map_err(|_| Status::InternalServerError)?;

    Ok(session_token)
}

/// Mirrors the bearer token into an HTTP-only cookie for browser clients.
fn set_session_cookie(cookies: &CookieJar<'_>, session_token: &str) {
    let secure_flag = !cfg!(test);
    let cookie = Cookie::build((SESSION_COOKIE, session_token.to_string()))
        .http_only(true)
        .secure(secure_flag)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    cookies.add(cookie);
}

/// Processes a complete login: validates input, finds the user, verifies the
/// password, issues a token and sets the session cookie.
///
/// # Returns
/// * `Ok((token, User))` - Login successful
/// * `Err(Status::BadRequest)` - Empty email or password provided
/// * `Err(Status::Unauthorized)` - Invalid credentials or user not found
/// * `Err(Status::InternalServerError)` - Database operation failed
pub async fn process_login<D: DbRunner>(
    db: &D,
    cookies: &CookieJar<'_>,
    login: &crate::api::login::LoginRequest,
) -> Result<(String, User), Status> {
    if login.email.trim().is_empty() || login.password.trim().is_empty() {
        return Err(Status::BadRequest);
    }

    let user = match find_user_by_email(db, &login.email).await? {
        Some(user) => user,
        None => return Err(Status::Unauthorized),
    };

    if !verify_password(&login.password, &user.password_hash) {
        return Err(Status::Unauthorized);
    }

    let session_token = create_and_store_session(db, user.id).await?;
    set_session_cookie(cookies, &session_token);

    Ok((session_token, user))
}

/// Hashes a password using Argon2 with a random salt.
///
/// # Panics
/// Panics if hashing fails (should not happen in normal operation)
pub fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("Hashing should succeed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserInput;
    use crate::orm::logout::revoke_session;
    use crate::orm::testing::{setup_test_db, setup_test_dbconn};
    use crate::orm::user::insert_user;

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password");

        assert!(verify_password("correct_password", &hash));
        assert!(!verify_password("wrong_password", &hash));
        assert!(!verify_password("correct_password", "not-a-phc-string"));
    }

    fn insert_dummy_user(conn: &mut diesel::SqliteConnection) -> User {
        let input = UserInput {
            email: "Registrar@Example.com".to_string(),
            full_name: "Nimal Perera".to_string(),
            password: "dummy password".to_string(),
            role: "admin".to_string(),
        };
        insert_user(conn, input).expect("insert dummy user")
    }

    #[tokio::test]
    async fn test_find_user_by_email_ignores_case() {
        let mut conn = setup_test_db();
        let inserted_user = insert_dummy_user(&mut conn);
        let fake_db = setup_test_dbconn(&mut conn);

        let found = find_user_by_email(&fake_db, "REGISTRAR@example.com ")
            .await
            .expect("db query should succeed")
            .expect("user should be found");

        assert_eq!(found.id, inserted_user.id);
        assert_eq!(found.role, "admin");
    }

    #[tokio::test]
    async fn test_token_resolves_until_revoked() {
        let mut conn = setup_test_db();
        let inserted_user = insert_dummy_user(&mut conn);
        let fake_db = setup_test_dbconn(&mut conn);

        let token = create_and_store_session(&fake_db, inserted_user.id)
            .await
            .expect("session creation should succeed");

        let owner = find_user_by_token(&fake_db, &token)
            .await
            .expect("db query should succeed");
        assert_eq!(owner.map(|u| u.id), Some(inserted_user.id));

        let revoked = revoke_session(&fake_db, &token).await.expect("revoke");
        assert_eq!(revoked, 1);

        let owner = find_user_by_token(&fake_db, &token)
            .await
            .expect("db query should succeed");
        assert!(owner.is_none());
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let mut conn = setup_test_db();
        let inserted_user = insert_dummy_user(&mut conn);

        let expired = NewSession {
            id: "expired-token".to_string(),
            user_id: inserted_user.id,
            created_at: Utc::now().naive_utc() - chrono::Duration::days(2),
            expires_at: Some(Utc::now().naive_utc() - chrono::Duration::days(1)),
            revoked: false,
        };
        diesel::insert_into(sessions::table)
            .values(&expired)
            .execute(&mut conn)
            .expect("insert expired session");

        let fake_db = setup_test_dbconn(&mut conn);
        let owner = find_user_by_token(&fake_db, "expired-token")
            .await
            .expect("db query should succeed");
        assert!(owner.is_none());
    }
}
