mod common;

use axum::http::{Method, StatusCode};

use common::app::spawn_test_server;
use common::auth::{auth_header, login_and_get_token};
use common::http::{assert_json_error, assert_status_ok_json, request, response_json};

#[tokio::test]
async fn it_register_login_me_roundtrip() {
    let app = spawn_test_server().await;

    let email = format!("user-{}@test.com", uuid::Uuid::new_v4());
    let register = request(
        &app.app,
        Method::POST,
        "/api/auth/register",
        Some(serde_json::json!({
            "email": email,
            "username": "roundtrip user",
            "password": "Passw0rd!",
        })),
        &[],
    )
    .await;
    let (status, headers, body) = response_json(register).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_status_ok_json(status, &body);
    assert!(headers.get("set-cookie").is_some());
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["user"]["email"], email);

    let login = request(
        &app.app,
        Method::POST,
        "/api/auth/login",
        Some(serde_json::json!({
            "email": email,
            "password": "Passw0rd!",
        })),
        &[],
    )
    .await;
    let (login_status, _, login_body) = response_json(login).await;
    assert_status_ok_json(login_status, &login_body);

    let me = request(
        &app.app,
        Method::GET,
        "/api/auth/me",
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (me_status, _, me_body) = response_json(me).await;
    assert_status_ok_json(me_status, &me_body);
    assert_eq!(me_body["data"]["email"], email);
}

#[tokio::test]
async fn it_register_rejects_invalid_email_and_weak_password() {
    let app = spawn_test_server().await;

    let bad_email = request(
        &app.app,
        Method::POST,
        "/api/auth/register",
        Some(serde_json::json!({
            "email": "not-an-email",
            "username": "someone",
            "password": "Passw0rd!",
        })),
        &[],
    )
    .await;
    let (status, _, body) = response_json(bad_email).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "AUTH_INVALID_EMAIL");

    let weak = request(
        &app.app,
        Method::POST,
        "/api/auth/register",
        Some(serde_json::json!({
            "email": "someone@test.com",
            "username": "someone",
            "password": "short",
        })),
        &[],
    )
    .await;
    let (status, _, body) = response_json(weak).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "AUTH_WEAK_PASSWORD");
}

#[tokio::test]
async fn it_duplicate_email_conflicts() {
    let app = spawn_test_server().await;

    let email = format!("dup-{}@test.com", uuid::Uuid::new_v4());
    let payload = serde_json::json!({
        "email": email,
        "username": "dup user",
        "password": "Passw0rd!",
    });

    let first = request(&app.app, Method::POST, "/api/auth/register", Some(payload.clone()), &[]).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = request(&app.app, Method::POST, "/api/auth/register", Some(payload), &[]).await;
    let (status, _, body) = response_json(second).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_json_error(&body, "AUTH_EMAIL_EXISTS");
}

#[tokio::test]
async fn it_login_with_wrong_password_is_unauthorized() {
    let app = spawn_test_server().await;
    let _token = login_and_get_token(&app.app).await;

    let login = request(
        &app.app,
        Method::POST,
        "/api/auth/login",
        Some(serde_json::json!({
            "email": "nobody@test.com",
            "password": "Wrong1234",
        })),
        &[],
    )
    .await;
    let (status, _, body) = response_json(login).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn it_logout_revokes_session() {
    let app = spawn_test_server().await;
    let token = login_and_get_token(&app.app).await;

    let logout = request(
        &app.app,
        Method::POST,
        "/api/auth/logout",
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;
    assert_eq!(logout.status(), StatusCode::OK);

    let me = request(
        &app.app,
        Method::GET,
        "/api/auth/me",
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(me).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_json_error(&body, "AUTH_UNAUTHORIZED");
}

#[tokio::test]
async fn it_protected_route_requires_token() {
    let app = spawn_test_server().await;

    let me = request(&app.app, Method::GET, "/api/auth/me", None, &[]).await;
    let (status, _, body) = response_json(me).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_json_error(&body, "AUTH_UNAUTHORIZED");
    // request_id middleware injects a traceId into error bodies
    assert!(body.get("traceId").is_some());
}
