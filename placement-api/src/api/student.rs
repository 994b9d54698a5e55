//! API endpoints for student registrations.
//!
//! Students are never hard-deleted: `DELETE` flips them to `inactive` so
//! analytics keep counting them.

use chrono::Utc;
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;

use super::{ApiError, api_error, internal_error};
use crate::logged_json::LoggedJson;
use crate::models::{Student, StudentChanges, StudentInput, StudentStatus, StudentUpdate};
use crate::orm::DbConn;
use crate::orm::student::{
    StudentFilter, deactivate_student, get_student, insert_student, list_students, update_student,
};
use crate::session_guards::{StudentDeleter, StudentManager, StudentViewer};

fn validate_input(input: &StudentInput) -> Result<(), ApiError> {
    if input.full_name.trim().is_empty() {
        return Err(api_error(Status::BadRequest, "full_name is required"));
    }
    if input.district.trim().is_empty() || input.province.trim().is_empty() {
        return Err(api_error(Status::BadRequest, "district and province are required"));
    }
    Ok(())
}

/// List Students endpoint.
///
/// - **URL:** `/api/1/Students?status=<status>&district=<district>`
/// - **Method:** `GET`
/// - **Purpose:** Lists students, newest registrations first
/// - **Authentication:** Required, `view_students`
///
/// Both filters are optional. An unknown `status` is a 400.
#[get("/1/Students?<status>&<district>")]
pub async fn list(
    db: DbConn,
    _viewer: StudentViewer,
    status: Option<String>,
    district: Option<String>,
) -> Result<Json<Vec<Student>>, ApiError> {
    let status = match status {
        Some(raw) => Some(
            raw.parse::<StudentStatus>()
                .map_err(|e| api_error(Status::BadRequest, e))?,
        ),
        None => None,
    };
    let filter = StudentFilter { status, district };

    db.run(move |conn| list_students(conn, &filter))
        .await
        .map(Json)
        .map_err(|e| internal_error("Error listing students", e))
}

/// Get Student endpoint.
///
/// - **URL:** `/api/1/Students/<id>`
/// - **Method:** `GET`
/// - **Authentication:** Required, `view_students`
#[get("/1/Students/<id>")]
pub async fn get(db: DbConn, id: i32, _viewer: StudentViewer) -> Result<Json<Student>, ApiError> {
    match db.run(move |conn| get_student(conn, id)).await {
        Ok(Some(student)) => Ok(Json(student)),
        Ok(None) => Err(api_error(Status::NotFound, "Student not found")),
        Err(e) => Err(internal_error("Error fetching student", e)),
    }
}

/// Register Student endpoint.
///
/// - **URL:** `/api/1/Students`
/// - **Method:** `POST`
/// - **Purpose:** Registers a student; the new record is `pending`
/// - **Authentication:** Required, `manage_students`
///
/// # Response
///
/// **Success (HTTP 201 Created):** the stored student
#[post("/1/Students", data = "<input>")]
pub async fn create(
    db: DbConn,
    input: LoggedJson<StudentInput>,
    manager: StudentManager,
) -> Result<status::Created<Json<Student>>, ApiError> {
    let input = input.into_inner();
    validate_input(&input)?;

    let student = db
        .run(move |conn| insert_student(conn, input, Utc::now().naive_utc()))
        .await
        .map_err(|e| internal_error("Error registering student", e))?;

    info!("{} registered student {}", manager.user.email, student.id);
    Ok(status::Created::new(format!("/api/1/Students/{}", student.id)).body(Json(student)))
}

/// Update Student endpoint.
///
/// - **URL:** `/api/1/Students/<id>`
/// - **Method:** `PUT`
/// - **Purpose:** Partial update; absent fields are kept
/// - **Authentication:** Required, `manage_students`
#[put("/1/Students/<id>", data = "<update>")]
pub async fn update(
    db: DbConn,
    id: i32,
    update: LoggedJson<StudentUpdate>,
    _manager: StudentManager,
) -> Result<Json<Student>, ApiError> {
    let changes = StudentChanges::from_update(update.into_inner(), Utc::now().naive_utc());
    match db.run(move |conn| update_student(conn, id, changes)).await {
        Ok(Some(student)) => Ok(Json(student)),
        Ok(None) => Err(api_error(Status::NotFound, "Student not found")),
        Err(e) => Err(internal_error("Error updating student", e)),
    }
}

/// Deactivate Student endpoint.
///
/// - **URL:** `/api/1/Students/<id>`
/// - **Method:** `DELETE`
/// - **Purpose:** Soft delete; the student becomes `inactive`
/// - **Authentication:** Required, `delete_students`
#[delete("/1/Students/<id>")]
pub async fn deactivate(
    db: DbConn,
    id: i32,
    deleter: StudentDeleter,
) -> Result<status::NoContent, ApiError> {
    match db
        .run(move |conn| deactivate_student(conn, id, Utc::now().naive_utc()))
        .await
    {
        Ok(true) => {
            info!("{} deactivated student {}", deleter.user.email, id);
            Ok(status::NoContent)
        }
        Ok(false) => Err(api_error(Status::NotFound, "Student not found")),
        Err(e) => Err(internal_error("Error deactivating student", e)),
    }
}

pub fn routes() -> Vec<Route> {
    routes![list, get, create, update, deactivate]
}
