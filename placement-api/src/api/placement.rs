//! API endpoints for placements of students with partner companies.

use chrono::Utc;
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;

use super::{ApiError, api_error, internal_error};
use crate::logged_json::LoggedJson;
use crate::models::{Placement, PlacementInput, PlacementWithDetails};
use crate::orm::DbConn;
use crate::orm::placement::{
    PlacementCreation, create_placement, delete_placement, get_placement,
    list_placements_with_details,
};
use crate::session_guards::{PlacementManager, PlacementViewer};

/// List Placements endpoint.
///
/// - **URL:** `/api/1/Placements?limit=<n>`
/// - **Method:** `GET`
/// - **Purpose:** Placements with student and company names, latest start
///   date first
/// - **Authentication:** Required, `view_placements`
#[get("/1/Placements?<limit>")]
pub async fn list(
    db: DbConn,
    limit: Option<i64>,
    _viewer: PlacementViewer,
) -> Result<Json<Vec<PlacementWithDetails>>, ApiError> {
    if limit.is_some_and(|l| l < 1) {
        return Err(api_error(Status::BadRequest, "limit must be positive"));
    }
    db.run(move |conn| list_placements_with_details(conn, limit))
        .await
        .map(Json)
        .map_err(|e| internal_error("Error listing placements", e))
}

/// Get Placement endpoint.
///
/// - **URL:** `/api/1/Placements/<id>`
/// - **Method:** `GET`
/// - **Authentication:** Required, `view_placements`
#[get("/1/Placements/<id>")]
pub async fn get(
    db: DbConn,
    id: i32,
    _viewer: PlacementViewer,
) -> Result<Json<Placement>, ApiError> {
    match db.run(move |conn| get_placement(conn, id)).await {
        Ok(Some(placement)) => Ok(Json(placement)),
        Ok(None) => Err(api_error(Status::NotFound, "Placement not found")),
        Err(e) => Err(internal_error("Error fetching placement", e)),
    }
}

/// Create Placement endpoint.
///
/// - **URL:** `/api/1/Placements`
/// - **Method:** `POST`
/// - **Purpose:** Records a placement and marks the student `employed`,
///   atomically
/// - **Authentication:** Required, `manage_placements`
///
/// **Failure:** 404 when the student or the company does not exist.
#[post("/1/Placements", data = "<input>")]
pub async fn create(
    db: DbConn,
    input: LoggedJson<PlacementInput>,
    manager: PlacementManager,
) -> Result<status::Created<Json<Placement>>, ApiError> {
    let input = input.into_inner();
    if input.position.trim().is_empty() {
        return Err(api_error(Status::BadRequest, "position is required"));
    }

    match db
        .run(move |conn| create_placement(conn, input, Utc::now().naive_utc()))
        .await
    {
        Ok(PlacementCreation::Created(placement)) => {
            info!(
                "{} placed student {} with company {}",
                manager.user.email, placement.student_id, placement.company_id
            );
            Ok(status::Created::new(format!("/api/1/Placements/{}", placement.id))
                .body(Json(placement)))
        }
        Ok(PlacementCreation::StudentNotFound) => {
            Err(api_error(Status::NotFound, "Student not found"))
        }
        Ok(PlacementCreation::CompanyNotFound) => {
            Err(api_error(Status::NotFound, "Company not found"))
        }
        Err(e) => Err(internal_error("Error creating placement", e)),
    }
}

/// Delete Placement endpoint.
///
/// - **URL:** `/api/1/Placements/<id>`
/// - **Method:** `DELETE`
/// - **Authentication:** Required, `manage_placements`
///
/// The student's status is not changed.
#[delete("/1/Placements/<id>")]
pub async fn delete(
    db: DbConn,
    id: i32,
    _manager: PlacementManager,
) -> Result<status::NoContent, ApiError> {
    match db.run(move |conn| delete_placement(conn, id)).await {
        Ok(true) => Ok(status::NoContent),
        Ok(false) => Err(api_error(Status::NotFound, "Placement not found")),
        Err(e) => Err(internal_error("Error deleting placement", e)),
    }
}

pub fn routes() -> Vec<Route> {
    routes![list, get, create, delete]
}
