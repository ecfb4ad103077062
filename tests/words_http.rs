mod common;

use axum::http::{Method, StatusCode};

use common::app::spawn_test_server;
use common::auth::{auth_header, create_word, login_and_get_token};
use common::http::{assert_json_error, request, response_json};

#[tokio::test]
async fn it_word_create_and_list() {
    let app = spawn_test_server().await;
    let token = login_and_get_token(&app.app).await;

    let create = request(
        &app.app,
        Method::POST,
        "/api/words",
        Some(serde_json::json!({
            "text": "apple",
            "translation": "яблуко",
            "definition": "a round fruit",
            "wordType": "noun",
            "level": "A1",
        })),
        &[("authorization", auth_header(&token))],
    )
    .await;

    let (create_status, _, create_body) = response_json(create).await;
    assert_eq!(create_status, StatusCode::CREATED);
    assert_eq!(create_body["data"]["text"], "apple");

    let list = request(
        &app.app,
        Method::GET,
        "/api/words?page=1&perPage=20",
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;

    let (list_status, _, body) = response_json(list).await;
    assert_eq!(list_status, StatusCode::OK);
    assert!(body["data"]["data"].is_array());
    assert!(!body["data"]["data"].as_array().unwrap().is_empty());
    assert!(body["data"]["page"].as_u64().unwrap() == 1);
    assert!(body["data"]["perPage"].as_u64().unwrap() == 20);
}

#[tokio::test]
async fn it_word_list_large_per_page_is_clamped() {
    let app = spawn_test_server().await;
    let token = login_and_get_token(&app.app).await;

    // perPage=200 should be clamped to 100, not error
    let list = request(
        &app.app,
        Method::GET,
        "/api/words?page=1&perPage=200",
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;

    let (status, _, body) = response_json(list).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["perPage"].as_u64().unwrap(), 100);
}

#[tokio::test]
async fn it_duplicate_word_text_conflicts() {
    let app = spawn_test_server().await;
    let token = login_and_get_token(&app.app).await;

    let _id = create_word(&app.app, &token, "banana").await;

    let dup = request(
        &app.app,
        Method::POST,
        "/api/words",
        Some(serde_json::json!({
            "text": "Banana",
            "translation": "банан",
            "definition": "a long fruit",
        })),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(dup).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_json_error(&body, "WORD_TEXT_EXISTS");
}

#[tokio::test]
async fn it_get_word_and_count() {
    let app = spawn_test_server().await;
    let token = login_and_get_token(&app.app).await;

    let id = create_word(&app.app, &token, "cherry").await;

    let get = request(
        &app.app,
        Method::GET,
        &format!("/api/words/{id}"),
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(get).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["text"], "cherry");

    let count = request(
        &app.app,
        Method::GET,
        "/api/words/count",
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (count_status, _, count_body) = response_json(count).await;
    assert_eq!(count_status, StatusCode::OK);
    assert_eq!(count_body["data"]["total"], 1);
}

#[tokio::test]
async fn it_missing_word_is_404() {
    let app = spawn_test_server().await;
    let token = login_and_get_token(&app.app).await;

    let get = request(
        &app.app,
        Method::GET,
        "/api/words/does-not-exist",
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(get).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");
}

#[tokio::test]
async fn it_empty_word_text_is_rejected() {
    let app = spawn_test_server().await;
    let token = login_and_get_token(&app.app).await;

    let create = request(
        &app.app,
        Method::POST,
        "/api/words",
        Some(serde_json::json!({
            "text": "   ",
            "translation": "x",
            "definition": "y",
        })),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (status, _, body) = response_json(create).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "WORD_INVALID_TEXT");
}
