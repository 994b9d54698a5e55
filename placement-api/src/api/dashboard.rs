//! Role-dependent landing page data.

use diesel::SqliteConnection;
use rocket::Route;
use rocket::serde::json::Json;
use serde::Serialize;
use ts_rs::TS;

use super::{ApiError, internal_error};
use crate::analytics::metrics::rate;
use crate::models::{PlacementWithDetails, Student, StudentStatus};
use crate::orm::DbConn;
use crate::orm::company::count_companies;
use crate::orm::placement::{count_placements, list_placements_with_details};
use crate::orm::student::{count_students_by_status, recent_students};
use crate::permissions::Role;
use crate::session_guards::DashboardViewer;

const RECENT_ITEMS: i64 = 5;

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct StatusCount {
    pub status: StudentStatus,
    pub count: i64,
}

/// Dashboard payload, tagged by `view`.
#[derive(Debug, Serialize, TS)]
#[serde(tag = "view", rename_all = "lowercase")]
#[ts(export)]
pub enum Dashboard {
    Management {
        student_counts: Vec<StatusCount>,
        total_students: i64,
        company_count: i64,
        placement_count: i64,
        overall_success_rate: f64,
        recent_placements: Vec<PlacementWithDetails>,
    },
    Teacher {
        student_counts: Vec<StatusCount>,
        total_students: i64,
        recent_students: Vec<Student>,
    },
}

/// One entry per status, zero-filled, in lifecycle order.
fn status_counts(conn: &mut SqliteConnection) -> Result<Vec<StatusCount>, diesel::result::Error> {
    let rows = count_students_by_status(conn)?;
    Ok(StudentStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: rows
                .iter()
                .find(|(name, _)| name == status.as_str())
                .map(|(_, count)| *count)
                .unwrap_or(0),
        })
        .collect())
}

fn count_of(counts: &[StatusCount], status: StudentStatus) -> i64 {
    counts
        .iter()
        .find(|c| c.status == status)
        .map(|c| c.count)
        .unwrap_or(0)
}

fn build_dashboard(
    conn: &mut SqliteConnection,
    role: Role,
) -> Result<Dashboard, diesel::result::Error> {
    let student_counts = status_counts(conn)?;
    let total_students = student_counts.iter().map(|c| c.count).sum();

    if role == Role::Teacher {
        return Ok(Dashboard::Teacher {
            recent_students: recent_students(conn, RECENT_ITEMS)?,
            student_counts,
            total_students,
        });
    }

    Ok(Dashboard::Management {
        overall_success_rate: rate(
            count_of(&student_counts, StudentStatus::Employed),
            total_students,
        ),
        company_count: count_companies(conn)?,
        placement_count: count_placements(conn)?,
        recent_placements: list_placements_with_details(conn, Some(RECENT_ITEMS))?,
        student_counts,
        total_students,
    })
}

/// Dashboard endpoint.
///
/// - **URL:** `/api/1/dashboard`
/// - **Method:** `GET`
/// - **Purpose:** Landing page numbers for the caller's role
/// - **Authentication:** Required, `view_dashboard`
///
/// Teachers get `"view": "teacher"` with recent registrations; everyone else
/// gets `"view": "management"` with company, placement and success figures.
#[get("/1/dashboard")]
pub async fn dashboard(db: DbConn, viewer: DashboardViewer) -> Result<Json<Dashboard>, ApiError> {
    let role = viewer.role;
    db.run(move |conn| build_dashboard(conn, role))
        .await
        .map(Json)
        .map_err(|e| internal_error("Error building dashboard", e))
}

pub fn routes() -> Vec<Route> {
    routes![dashboard]
}
