use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::{AsChangeset, Identifiable, Insertable, Queryable, QueryableByName, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::students;

/// Lifecycle of a student record.
///
/// `Employed` is set when a placement is created; `Inactive` is the soft
/// delete state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum StudentStatus {
    Pending,
    Active,
    Employed,
    Inactive,
}

impl StudentStatus {
    pub const ALL: [StudentStatus; 4] = [
        StudentStatus::Pending,
        StudentStatus::Active,
        StudentStatus::Employed,
        StudentStatus::Inactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Pending => "pending",
            StudentStatus::Active => "active",
            StudentStatus::Employed => "employed",
            StudentStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(StudentStatus::Pending),
            "active" => Ok(StudentStatus::Active),
            "employed" => Ok(StudentStatus::Employed),
            "inactive" => Ok(StudentStatus::Inactive),
            other => Err(format!("Unknown student status '{}'", other)),
        }
    }
}

#[derive(
    Deserialize, Queryable, Selectable, Identifiable, QueryableByName, Debug, Clone, Serialize, TS,
)]
#[diesel(table_name = students)]
#[ts(export)]
pub struct Student {
    pub id: i32,
    pub full_name: String,
    pub nic: Option<String>,
    pub district: String,
    pub province: String,
    #[ts(type = "string | null")]
    pub date_of_birth: Option<NaiveDate>,
    pub sex: String,
    pub marital_status: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub has_ol: bool,
    pub has_al: bool,
    pub status: String,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = students)]
pub struct NewStudent {
    pub full_name: String,
    pub nic: Option<String>,
    pub district: String,
    pub province: String,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: String,
    pub marital_status: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub has_ol: bool,
    pub has_al: bool,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Registration payload. New students always start out `pending`.
#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct StudentInput {
    pub full_name: String,
    pub nic: Option<String>,
    pub district: String,
    pub province: String,
    #[ts(type = "string | null")]
    pub date_of_birth: Option<NaiveDate>,
    pub sex: String,
    pub marital_status: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub has_ol: bool,
    #[serde(default)]
    pub has_al: bool,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct StudentUpdate {
    pub full_name: Option<String>,
    pub nic: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
    #[ts(type = "string | null")]
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<String>,
    pub marital_status: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub has_ol: Option<bool>,
    pub has_al: Option<bool>,
    pub status: Option<StudentStatus>,
}

#[derive(AsChangeset)]
#[diesel(table_name = students)]
pub struct StudentChanges {
    pub full_name: Option<String>,
    pub nic: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub sex: Option<String>,
    pub marital_status: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub has_ol: Option<bool>,
    pub has_al: Option<bool>,
    pub status: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl StudentChanges {
    pub fn from_update(update: StudentUpdate, now: NaiveDateTime) -> Self {
        StudentChanges {
            full_name: update.full_name,
            nic: update.nic,
            district: update.district,
            province: update.province,
            date_of_birth: update.date_of_birth,
            sex: update.sex,
            marital_status: update.marital_status,
            phone: update.phone,
            email: update.email,
            address: update.address,
            has_ol: update.has_ol,
            has_al: update.has_al,
            status: update.status.map(|s| s.as_str().to_string()),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("Employed".parse::<StudentStatus>(), Ok(StudentStatus::Employed));
        assert_eq!(" pending ".parse::<StudentStatus>(), Ok(StudentStatus::Pending));
        assert!("graduated".parse::<StudentStatus>().is_err());
    }

    #[test]
    fn test_status_round_trips_through_as_str() {
        for status in StudentStatus::ALL {
            assert_eq!(status.as_str().parse::<StudentStatus>(), Ok(status));
        }
    }
}
