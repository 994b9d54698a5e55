//! Operator roles and the static role -> permission table.
//!
//! Permissions are never stored in the database: a user row carries a
//! single role name and everything that role may do is looked up here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Developer,
    Owner,
    Admin,
    Teacher,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Developer, Role::Owner, Role::Admin, Role::Teacher];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Developer => "developer",
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Teacher => "teacher",
        }
    }

    /// Everything this role is allowed to do.
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Developer | Role::Owner => &[
                ViewDashboard,
                ViewStudents,
                ManageStudents,
                DeleteStudents,
                ViewCompanies,
                ManageCompanies,
                ViewPlacements,
                ManagePlacements,
                ViewAnalytics,
                ManageUsers,
            ],
            Role::Admin => &[
                ViewDashboard,
                ViewStudents,
                ManageStudents,
                DeleteStudents,
                ViewCompanies,
                ManageCompanies,
                ViewPlacements,
                ManagePlacements,
                ViewAnalytics,
            ],
            Role::Teacher => &[
                ViewDashboard,
                ViewStudents,
                ManageStudents,
                ViewCompanies,
                ViewPlacements,
            ],
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "developer" => Ok(Role::Developer),
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Permission {
    ViewDashboard,
    ViewStudents,
    ManageStudents,
    DeleteStudents,
    ViewCompanies,
    ManageCompanies,
    ViewPlacements,
    ManagePlacements,
    ViewAnalytics,
    ManageUsers,
}
