#[macro_use]
extern crate rocket;

use rocket::figment::value::{Map, Value};
use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use rocket::fs::FileServer;
use rocket::request::Request;
use rocket::serde::json::{self, Json, json};
use rocket::{Build, Catcher, Rocket};

pub mod admin_init_fairing;
pub mod analytics;
pub mod api;
pub mod logged_json;
pub mod models;
pub mod orm;
pub use orm::DbConn;
pub mod permissions;
pub mod schema;
pub mod session_guards;

#[cfg(test)]
pub mod generate_types;

#[catch(401)]
fn unauthorized(req: &Request) -> Json<json::Value> {
    Json(json!({
        "error": "Unauthorized",
        "path": req.uri().path().to_string(),
        "status": 401
    }))
}

#[catch(403)]
fn forbidden(req: &Request) -> Json<json::Value> {
    Json(json!({
        "error": "Forbidden",
        "path": req.uri().path().to_string(),
        "status": 403
    }))
}

#[catch(404)]
fn not_found(req: &Request) -> Json<json::Value> {
    Json(json!({
        "error": "Not Found",
        "path": req.uri().path().to_string(),
        "status": 404
    }))
}

#[catch(422)]
fn unprocessable_entity(req: &Request) -> Json<json::Value> {
    Json(json!({
        "error": "Unprocessable Entity",
        "path": req.uri().path().to_string(),
        "status": 422
    }))
}

#[catch(500)]
fn internal_server_error(req: &Request) -> Json<json::Value> {
    Json(json!({
        "error": "Internal Server Error",
        "path": req.uri().path().to_string(),
        "status": 500
    }))
}

#[catch(default)]
fn default_catcher(status: rocket::http::Status, req: &Request) -> Json<json::Value> {
    Json(json!({
        "error": status.reason().unwrap_or("Unknown Error"),
        "path": req.uri().path().to_string(),
        "status": status.code
    }))
}

/// JSON catchers for every error status the API produces.
pub fn catchers() -> Vec<Catcher> {
    catchers![
        unauthorized,
        forbidden,
        not_found,
        unprocessable_entity,
        internal_server_error,
        default_catcher
    ]
}

pub fn mount_api_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/api", api::routes())
}

fn log_rocket_info(rocket: &Rocket<Build>) {
    let figment = rocket.figment();

    if let Ok(address) = figment.extract_inner::<String>("address") {
        info!("Rocket is running at: {}", address);
    }

    if let Ok(port) = figment.extract_inner::<u16>("port") {
        info!("Rocket is listening on port: {}", port);
    }

    match figment.extract_inner::<Map<String, Value>>("databases.sqlite_db") {
        Ok(db_config) => match db_config.get("url") {
            Some(Value::String(_, url)) => info!("Database URL: {}", url),
            _ => warn!("Database URL not found in configuration"),
        },
        Err(e) => {
            warn!("Failed to extract database configuration: {}", e);
        }
    }
}

/// Builds the production Rocket.
///
/// Configuration is layered: Rocket defaults, `Rocket.toml`, `ROCKET_*`
/// environment variables, then `DATABASE_URL` (also read from `.env`) as
/// the database URL. Without `DATABASE_URL` the pool fairing fails at
/// ignite unless `Rocket.toml` names a URL.
///
/// Tests don't go through here; they use `orm::testing::test_rocket`.
pub fn rocket() -> Rocket<Build> {
    dotenvy::dotenv().ok();

    let mut figment = Figment::from(rocket::Config::default())
        .merge(Toml::file("Rocket.toml").nested())
        .merge(Env::prefixed("ROCKET_").global());
    match std::env::var("DATABASE_URL") {
        Ok(database_url) => figment = figment.merge(("databases.sqlite_db.url", database_url)),
        Err(_) => error!("DATABASE_URL is not set"),
    }

    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(orm::set_foreign_keys_fairing())
        .attach(orm::run_migrations_fairing())
        .attach(admin_init_fairing::admin_init_fairing())
        .register("/", catchers());

    log_rocket_info(&rocket);

    let static_dir =
        std::env::var("PLACEMENT_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
    mount_api_routes(rocket).mount("/", FileServer::from(static_dir).rank(10))
}
