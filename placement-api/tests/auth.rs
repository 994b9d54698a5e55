use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{Value, json};

use placement_api::orm::testing::{TEST_PASSWORD, test_rocket};

async fn login(client: &Client, email: &str) -> String {
    let response = client
        .post("/api/1/login")
        .header(ContentType::JSON)
        .body(json!({ "email": email, "password": TEST_PASSWORD }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.expect("valid login JSON");
    body["token"].as_str().expect("token in body").to_string()
}

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

#[rocket::async_test]
async fn test_login_returns_token_and_permissions() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = client
        .post("/api/1/login")
        .json(&json!({ "email": "Teacher@Example.com", "password": TEST_PASSWORD }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert!(response.cookies().get("session").is_some());

    let body: Value = response.into_json().await.unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email"], "teacher@example.com");
    assert_eq!(body["user"]["role"], "teacher");
    assert!(body["user"].get("password_hash").is_none());

    let permissions: Vec<&str> = body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert!(permissions.contains(&"manage_students"));
    assert!(!permissions.contains(&"view_analytics"));
}

#[rocket::async_test]
async fn test_login_failures() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = client
        .post("/api/1/login")
        .json(&json!({ "email": "admin@example.com", "password": "wrong" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");

    let response = client
        .post("/api/1/login")
        .json(&json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client
        .post("/api/1/login")
        .json(&json!({ "email": "  ", "password": "" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[rocket::async_test]
async fn test_me_requires_a_valid_token() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = client.get("/api/1/me").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["status"], 401);
    assert_eq!(body["path"], "/api/1/me");

    let response = client
        .get("/api/1/me")
        .header(bearer("not-a-real-token"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client
        .get("/api/1/me")
        .header(Header::new("Authorization", "Basic YWRtaW46YWRtaW4="))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    let token = login(&client, "owner@example.com").await;
    let response = client.get("/api/1/me").header(bearer(&token)).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["role"], "owner");
    assert_eq!(body["user"]["email"], "owner@example.com");
    assert_eq!(body["permissions"].as_array().unwrap().len(), 10);
}

#[rocket::async_test]
async fn test_session_cookie_authenticates() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = client
        .post("/api/1/login")
        .json(&json!({ "email": "admin@example.com", "password": TEST_PASSWORD }))
        .dispatch()
        .await;
    let cookie = response
        .cookies()
        .get("session")
        .expect("Session cookie should be set")
        .clone()
        .into_owned();

    let response = client.get("/api/1/me").cookie(cookie).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
}

#[rocket::async_test]
async fn test_logout_revokes_token() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let token = login(&client, "admin@example.com").await;

    let response = client
        .post("/api/1/logout")
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client.get("/api/1/me").header(bearer(&token)).dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client.post("/api/1/logout").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[rocket::async_test]
async fn test_status_needs_no_login() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = client.get("/api/1/status").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["status"], "running");
    assert_eq!(body["database"], "ok");
}

#[rocket::async_test]
async fn test_unknown_route_uses_json_catcher() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = client.get("/api/1/nothing-here").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["error"], "Not Found");
}
