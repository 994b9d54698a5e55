//! HTTP API, version 1. Everything here is mounted under `/api`.

pub mod analytics;
pub mod company;
pub mod dashboard;
pub mod login;
pub mod placement;
pub mod status;
pub mod student;
pub mod user;

use rocket::Route;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::Serialize;
use ts_rs::TS;

/// Error body returned by every handler failure.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}

/// A status code with an `{ "error": ... }` body.
pub type ApiError = Custom<Json<ErrorResponse>>;

pub fn api_error(status: Status, message: impl Into<String>) -> ApiError {
    Custom(
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Logs a database failure and turns it into a generic 500.
pub fn internal_error(context: &str, e: impl std::fmt::Debug) -> ApiError {
    error!("{}: {:?}", context, e);
    api_error(Status::InternalServerError, "Internal server error")
}

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(analytics::routes());
    routes.extend(company::routes());
    routes.extend(dashboard::routes());
    routes.extend(login::routes());
    routes.extend(placement::routes());
    routes.extend(status::routes());
    routes.extend(student::routes());
    routes.extend(user::routes());
    routes
}
