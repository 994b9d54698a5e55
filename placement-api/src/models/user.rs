use crate::schema::users;
use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, QueryableByName, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Queryable, Selectable, Identifiable, QueryableByName, Debug, Clone, Serialize, TS)]
#[diesel(table_name = users)]
#[ts(export)]
pub struct User {
    pub id: i32,
    pub email: String, // Will be unique
    pub full_name: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: String,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Payload for creating an operator account. The password arrives in clear
/// text and is hashed before it reaches the database.
#[derive(Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UserInput {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: String,
}
