//! Query batch executor.
//!
//! A report issues its fixed statement set through a [`ConnectionSource`].
//! In production that is [`PooledSource`], which checks out a separate
//! pooled connection per statement so the whole batch runs concurrently.
//! Tests drive the same batch code through [`FakeDbConn`] on a single
//! in-memory connection.

use std::future::Future;

use diesel::QueryResult;
use diesel::sqlite::SqliteConnection;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};
use rocket::{Orbit, Rocket};

use super::AnalyticsError;
use crate::orm::DbConn;
use crate::orm::testing::FakeDbConn;

/// Something that can run one read-only statement to completion.
pub trait ConnectionSource {
    /// Runs `f` on a connection. `statement` names the query in errors and
    /// logs.
    fn run_statement<F, R>(
        &self,
        statement: &'static str,
        f: F,
    ) -> impl Future<Output = Result<R, AnalyticsError>>
    where
        F: FnOnce(&mut SqliteConnection) -> QueryResult<R> + Send + 'static,
        R: Send + 'static;
}

/// Connection source backed by the Rocket database pool.
///
/// Each statement checks out its own connection, so statements joined with
/// `try_join!` are in flight at the same time. Pool sizing and waiting are
/// left entirely to the pool.
pub struct PooledSource<'a> {
    rocket: &'a Rocket<Orbit>,
}

impl<'a> PooledSource<'a> {
    pub fn new(rocket: &'a Rocket<Orbit>) -> Self {
        PooledSource { rocket }
    }
}

impl ConnectionSource for PooledSource<'_> {
    fn run_statement<F, R>(
        &self,
        statement: &'static str,
        f: F,
    ) -> impl Future<Output = Result<R, AnalyticsError>>
    where
        F: FnOnce(&mut SqliteConnection) -> QueryResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let rocket = self.rocket;
        async move {
            let conn = DbConn::get_one(rocket)
                .await
                .ok_or(AnalyticsError::PoolUnavailable { statement })?;
            conn.run(f)
                .await
                .map_err(|source| AnalyticsError::Statement { statement, source })
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for PooledSource<'r> {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let rocket = request.rocket();
        if DbConn::pool(rocket).is_none() {
            error!("Analytics requested but no database pool is attached");
            return Outcome::Error((Status::InternalServerError, ()));
        }
        Outcome::Success(PooledSource::new(rocket))
    }
}

impl<'a> ConnectionSource for FakeDbConn<'a> {
    fn run_statement<F, R>(
        &self,
        statement: &'static str,
        f: F,
    ) -> impl Future<Output = Result<R, AnalyticsError>>
    where
        F: FnOnce(&mut SqliteConnection) -> QueryResult<R> + Send + 'static,
        R: Send + 'static,
    {
        async move {
            self.run(f)
                .await
                .map_err(|source| AnalyticsError::Statement { statement, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::{setup_test_db, setup_test_dbconn};
    use diesel::RunQueryDsl;

    #[tokio::test]
    async fn test_failed_statement_is_named() {
        let mut conn = setup_test_db();
        let db = setup_test_dbconn(&mut conn);

        let result = db
            .run_statement("broken_statement", |c| {
                diesel::sql_query("SELECT * FROM no_such_table").execute(c)
            })
            .await;

        match result {
            Err(AnalyticsError::Statement { statement, .. }) => {
                assert_eq!(statement, "broken_statement")
            }
            other => panic!("expected a statement error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_batch() {
        let mut conn = setup_test_db();
        let db = setup_test_dbconn(&mut conn);

        let batch = tokio::try_join!(
            db.run_statement("ok", |c| diesel::sql_query("SELECT 1").execute(c)),
            db.run_statement("bad", |c| diesel::sql_query("SELECT nope FROM nowhere")
                .execute(c)),
        );

        assert!(matches!(
            batch,
            Err(AnalyticsError::Statement { statement: "bad", .. })
        ));
    }
}
