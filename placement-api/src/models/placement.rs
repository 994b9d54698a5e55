use chrono::{NaiveDate, NaiveDateTime};
use diesel::{Identifiable, Insertable, Queryable, QueryableByName, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::placements;

#[derive(
    Deserialize, Queryable, Selectable, Identifiable, QueryableByName, Debug, Clone, Serialize, TS,
)]
#[diesel(table_name = placements)]
#[ts(export)]
pub struct Placement {
    pub id: i32,
    pub student_id: i32,
    pub company_id: i32,
    pub position: String,
    pub salary: Option<f64>,
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    pub contract_duration_months: Option<i32>,
    pub visa_type: Option<String>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = placements)]
pub struct NewPlacement {
    pub student_id: i32,
    pub company_id: i32,
    pub position: String,
    pub salary: Option<f64>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub contract_duration_months: Option<i32>,
    pub visa_type: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct PlacementInput {
    pub student_id: i32,
    pub company_id: i32,
    pub position: String,
    pub salary: Option<f64>,
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[ts(type = "string | null")]
    pub end_date: Option<NaiveDate>,
    pub contract_duration_months: Option<i32>,
    pub visa_type: Option<String>,
}

/// A placement joined with the names a listing screen needs.
#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct PlacementWithDetails {
    #[serde(flatten)]
    pub placement: Placement,
    pub student_name: String,
    pub company_name: String,
    pub country: String,
}
