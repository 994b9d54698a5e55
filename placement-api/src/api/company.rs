//! API endpoints for partner companies.

use chrono::Utc;
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;

use super::{ApiError, api_error, internal_error};
use crate::logged_json::LoggedJson;
use crate::models::{Company, CompanyInput, CompanyUpdate};
use crate::orm::DbConn;
use crate::orm::company::{
    CompanyDeletion, delete_company, get_all_companies, get_company_by_id,
    get_company_by_name_case_insensitive, insert_company, update_company,
};
use crate::session_guards::{CompanyManager, CompanyViewer};

/// Create Company endpoint.
///
/// - **URL:** `/api/1/Companies`
/// - **Method:** `POST`
/// - **Purpose:** Adds a partner company
/// - **Authentication:** Required, `manage_companies`
///
/// # Request Format
///
/// ```json
/// { "name": "Sakura Care", "country": "Japan", "industry": "Healthcare" }
/// ```
///
/// # Response
///
/// **Success (HTTP 201 Created):** the stored company
///
/// **Failure:** 400 on a blank name or country, 409 when a company with the
/// same name (case-insensitive) exists.
#[post("/1/Companies", data = "<new_company>")]
pub async fn create_company(
    db: DbConn,
    new_company: LoggedJson<CompanyInput>,
    _manager: CompanyManager,
) -> Result<status::Created<Json<Company>>, ApiError> {
    let new_company = new_company.into_inner();
    if new_company.name.trim().is_empty() || new_company.country.trim().is_empty() {
        return Err(api_error(Status::BadRequest, "name and country are required"));
    }

    db.run(move |conn| {
        match get_company_by_name_case_insensitive(conn, &new_company.name) {
            Ok(Some(_)) => {
                return Err(api_error(
                    Status::Conflict,
                    format!("Company with name '{}' already exists", new_company.name),
                ));
            }
            Ok(None) => {}
            Err(e) => return Err(internal_error("Error checking for existing company", e)),
        }

        insert_company(conn, new_company)
            .map(|comp| status::Created::new(format!("/api/1/Companies/{}", comp.id)).body(Json(comp)))
            .map_err(|e| internal_error("Error creating company", e))
    })
    .await
}

/// List Companies endpoint.
///
/// - **URL:** `/api/1/Companies`
/// - **Method:** `GET`
/// - **Authentication:** Required, `view_companies`
#[get("/1/Companies")]
pub async fn list_companies(
    db: DbConn,
    _viewer: CompanyViewer,
) -> Result<Json<Vec<Company>>, ApiError> {
    db.run(get_all_companies)
        .await
        .map(Json)
        .map_err(|e| internal_error("Error listing companies", e))
}

/// Get Company endpoint.
///
/// - **URL:** `/api/1/Companies/<id>`
/// - **Method:** `GET`
/// - **Authentication:** Required, `view_companies`
#[get("/1/Companies/<id>")]
pub async fn get_company(
    db: DbConn,
    id: i32,
    _viewer: CompanyViewer,
) -> Result<Json<Company>, ApiError> {
    match db.run(move |conn| get_company_by_id(conn, id)).await {
        Ok(Some(company)) => Ok(Json(company)),
        Ok(None) => Err(api_error(Status::NotFound, "Company not found")),
        Err(e) => Err(internal_error("Error fetching company", e)),
    }
}

/// Update Company endpoint.
///
/// - **URL:** `/api/1/Companies/<id>`
/// - **Method:** `PUT`
/// - **Purpose:** Partial update; absent fields are kept
/// - **Authentication:** Required, `manage_companies`
#[put("/1/Companies/<id>", data = "<update>")]
pub async fn update(
    db: DbConn,
    id: i32,
    update: LoggedJson<CompanyUpdate>,
    _manager: CompanyManager,
) -> Result<Json<Company>, ApiError> {
    let update = update.into_inner();
    match db
        .run(move |conn| update_company(conn, id, update, Utc::now().naive_utc()))
        .await
    {
        Ok(Some(company)) => Ok(Json(company)),
        Ok(None) => Err(api_error(Status::NotFound, "Company not found")),
        Err(e) => Err(internal_error("Error updating company", e)),
    }
}

/// Delete Company endpoint.
///
/// - **URL:** `/api/1/Companies/<id>`
/// - **Method:** `DELETE`
/// - **Authentication:** Required, `manage_companies`
///
/// **Failure:** 404 for an unknown company, 409 while placements still
/// reference it.
#[delete("/1/Companies/<id>")]
pub async fn delete(
    db: DbConn,
    id: i32,
    manager: CompanyManager,
) -> Result<status::NoContent, ApiError> {
    match db.run(move |conn| delete_company(conn, id)).await {
        Ok(CompanyDeletion::Deleted) => {
            info!("{} deleted company {}", manager.user.email, id);
            Ok(status::NoContent)
        }
        Ok(CompanyDeletion::NotFound) => Err(api_error(Status::NotFound, "Company not found")),
        Ok(CompanyDeletion::HasPlacements(count)) => Err(api_error(
            Status::Conflict,
            format!("Company still has {} placement(s)", count),
        )),
        Err(e) => Err(internal_error("Error deleting company", e)),
    }
}

pub fn routes() -> Vec<Route> {
    routes![create_company, list_companies, get_company, update, delete]
}
