//! Database operations for logout and token revocation.

use diesel::prelude::*;

use crate::orm::login::DbRunner;
use crate::schema::sessions::dsl::*;

/// Revokes a bearer token by marking its session as revoked.
///
/// The row is kept so the token can never be reused. Unknown tokens are not
/// an error: the returned row count is simply zero.
pub async fn revoke_session<D: DbRunner>(
    db: &D,
    token: &str,
) -> Result<usize, diesel::result::Error> {
    let token = token.to_string();
    db.run(move |conn| {
        diesel::update(sessions.filter(id.eq(&token)))
            .set(revoked.eq(true))
            .execute(conn)
    })
    .await
}
