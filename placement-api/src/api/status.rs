//! API version 1 - Status endpoints
//!
//! Health check for monitoring: build information plus whether the database
//! answers.

use diesel::RunQueryDsl;
use rocket::{Route, serde::json::Json};
use serde::Serialize;
use ts_rs::TS;

use crate::orm::DbConn;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Serialize, TS)]
#[ts(export)]
pub struct HealthStatus {
    status: &'static str,
    database: &'static str,
    version: &'static str,
    built: &'static str,
    git_commit: Option<&'static str>,
}

/// Health Status endpoint.
///
/// - **URL:** `/api/1/status`
/// - **Method:** `GET`
/// - **Purpose:** Returns the health status of the application
/// - **Authentication:** None required
///
/// # Response
///
/// **Success (HTTP 200 OK):**
/// ```json
/// {
///   "status": "running",
///   "database": "ok",
///   "version": "0.1.0",
///   "built": "Mon, 01 Sep 2025 09:00:00 +0000",
///   "git_commit": "5f2c0b4e6f2b0b0e3c7a9a4d9e1e2f3a4b5c6d7e"
/// }
/// ```
///
/// `database` is `"unavailable"` when no pooled connection could be had or
/// the probe query failed; the endpoint still answers 200.
#[get("/1/status")]
pub async fn health_status(db: Option<DbConn>) -> Json<HealthStatus> {
    let database = match db {
        Some(db) => match db.run(|c| diesel::sql_query("SELECT 1").execute(c)).await {
            Ok(_) => "ok",
            Err(e) => {
                warn!("Status probe query failed: {:?}", e);
                "unavailable"
            }
        },
        None => "unavailable",
    };

    Json(HealthStatus {
        status: "running",
        database,
        version: env!("CARGO_PKG_VERSION"),
        built: built_info::BUILT_TIME_UTC,
        git_commit: built_info::GIT_COMMIT_HASH,
    })
}

pub fn routes() -> Vec<Route> {
    routes![health_status]
}
