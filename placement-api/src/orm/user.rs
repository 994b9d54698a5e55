use chrono::Utc;
use diesel::prelude::*;

use crate::models::{NewUser, User, UserInput};
use crate::orm::last_insert_id;
use crate::orm::login::hash_password;

/// Inserts a new operator account.
///
/// The email is normalized to lower case and the clear-text password is
/// hashed with Argon2 before storage. Role validation is the caller's job.
pub fn insert_user(
    conn: &mut SqliteConnection,
    input: UserInput,
) -> Result<User, diesel::result::Error> {
    use crate::schema::users::dsl::*;

    let now = Utc::now().naive_utc();
    let new_user = NewUser {
        email: input.email.trim().to_lowercase(),
        full_name: input.full_name,
        password_hash: hash_password(&input.password),
        role: input.role.trim().to_lowercase(),
        created_at: now,
        updated_at: now,
    };

    conn.transaction(|conn| {
        diesel::insert_into(users).values(&new_user).execute(conn)?;
        let user_id = last_insert_id(conn)?;
        users
            .filter(id.eq(user_id))
            .select(User::as_select())
            .first(conn)
    })
}

/// Gets a user by ID.
pub fn get_user(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Option<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users
        .filter(id.eq(user_id))
        .select(User::as_select())
        .first(conn)
        .optional()
}

/// Gets a user by email (case-insensitive).
pub fn get_user_by_email(
    conn: &mut SqliteConnection,
    user_email: &str,
) -> Result<Option<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users
        .filter(email.eq(user_email.trim().to_lowercase()))
        .select(User::as_select())
        .first(conn)
        .optional()
}

/// Lists all users in ascending order by id.
pub fn list_all_users(conn: &mut SqliteConnection) -> Result<Vec<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users.order(id.asc()).select(User::as_select()).load(conn)
}

/// Deletes a user; their sessions go with them through `ON DELETE CASCADE`.
/// Returns Ok(true) if a row was deleted, Ok(false) if the user did not exist.
pub fn delete_user(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    let rows_affected = diesel::delete(users.filter(id.eq(user_id))).execute(conn)?;
    Ok(rows_affected > 0)
}
