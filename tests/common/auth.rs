use axum::http::Method;
use axum::Router;

use super::http::{request, response_json};

pub async fn login_and_get_token(app: &Router) -> String {
    let email = format!("user-{}@test.com", uuid::Uuid::new_v4());
    let username = format!("user-{}", uuid::Uuid::new_v4().simple());
    let password = "Passw0rd!";

    let response = request(
        app,
        Method::POST,
        "/api/auth/register",
        Some(serde_json::json!({
            "email": email,
            "username": username,
            "password": password,
        })),
        &[],
    )
    .await;

    let (status, _headers, body) = response_json(response).await;
    assert!(status.is_success(), "register failed: {body}");

    body["data"]["accessToken"]
        .as_str()
        .expect("access token in register response")
        .to_string()
}

pub fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}

/// Create a word through the API and return its id.
pub async fn create_word(app: &Router, token: &str, text: &str) -> String {
    let response = request(
        app,
        Method::POST,
        "/api/words",
        Some(serde_json::json!({
            "text": text,
            "translation": "переклад",
            "definition": "a test definition",
            "wordType": "noun",
            "level": "A2",
        })),
        &[("authorization", auth_header(token))],
    )
    .await;

    let (status, _headers, body) = response_json(response).await;
    assert!(status.is_success(), "create word failed: {body}");

    body["data"]["id"]
        .as_str()
        .expect("word id in create response")
        .to_string()
}
