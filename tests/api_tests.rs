use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use catalogd::api::AppState;
use catalogd::config::Config;
use catalogd::db::Store;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

/// Seeded accounts (must match the initial migration).
const OPERATOR_EMAIL: &str = "alex@gmail.com";
const ADMIN_EMAIL: &str = "maria@gmail.com";
const SEED_PASSWORD: &str = "123456";

async fn spawn_app() -> Router {
    let config = Config::default();

    // Single connection so the whole test shares one in-memory database.
    let store = Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to create store");

    let state = Arc::new(AppState::new(store, &config));
    catalogd::api::router(state)
}

fn client_basic_auth() -> String {
    format!("Basic {}", BASE64.encode("catalogd:catalogd123"))
}

async fn token_response(app: &Router, username: &str, password: &str) -> (StatusCode, serde_json::Value) {
    let form = format!("grant_type=password&username={username}&password={password}");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/token")
                .header("Authorization", client_basic_auth())
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

async fn obtain_token(app: &Router, username: &str) -> String {
    let (status, json) = token_response(app, username, SEED_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    json["access_token"].as_str().unwrap().to_string()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_token_carries_user_claims() {
    let app = spawn_app().await;

    let (status, json) = token_response(&app, ADMIN_EMAIL, SEED_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["userId"], 2);
    assert_eq!(json["userFirstName"], "Maria");
    assert_eq!(json["expires_in"], 86_400);
    assert_eq!(json["scope"], "read write");

    let (status, json) = token_response(&app, OPERATOR_EMAIL, SEED_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["userId"], 1);
    assert_eq!(json["userFirstName"], "Alex");
}

#[tokio::test]
async fn test_token_rejects_bad_credentials() {
    let app = spawn_app().await;

    let (status, _) = token_response(&app, ADMIN_EMAIL, "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = token_response(&app, "nobody@gmail.com", SEED_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_rejects_bad_client() {
    let app = spawn_app().await;

    let form = format!("grant_type=password&username={ADMIN_EMAIL}&password={SEED_PASSWORD}");
    let bad_client = format!("Basic {}", BASE64.encode("catalogd:not-the-secret"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/token")
                .header("Authorization", bad_client)
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_products_paged_and_sorted_by_name() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/products?page=0&size=12&sort=name,asc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["totalElements"], 25);
    assert_eq!(json["number"], 0);
    assert_eq!(json["size"], 12);
    assert_eq!(json["content"].as_array().unwrap().len(), 12);
    assert_eq!(json["content"][0]["name"], "Macbook Pro");
    assert_eq!(json["content"][1]["name"], "PC Gamer");
    assert_eq!(json["content"][2]["name"], "PC Gamer Alfa");
}

#[tokio::test]
async fn test_product_includes_categories() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/products/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["name"], "The Lord of the Rings");
    assert_eq!(json["categories"][0]["name"], "Livros");
}

#[tokio::test]
async fn test_product_not_found_has_standard_body() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/products/1000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = json_body(response).await;
    assert_eq!(json["status"], 404);
    assert_eq!(json["error"], "Resource not found");
    assert_eq!(json["path"], "/products/1000");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_sort_field_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/products?sort=dropTables,asc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_catalog_writes_require_token() {
    let app = spawn_app().await;

    let payload = serde_json::json!({
        "name": "New Product",
        "description": "desc",
        "price": 50.0,
        "imgUrl": "",
        "categories": [{"id": 1}]
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/products")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/products")
                .header("Authorization", "Bearer not-a-real-token")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_operator_manages_products() {
    let app = spawn_app().await;
    let token = obtain_token(&app, OPERATOR_EMAIL).await;

    let payload = serde_json::json!({
        "name": "PlayStation 5",
        "description": "Next-gen console",
        "price": 499.99,
        "imgUrl": "https://example.com/ps5.jpg",
        "categories": [{"id": 2}]
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/products")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["name"], "PlayStation 5");
    assert_eq!(created["categories"][0]["id"], 2);
    let id = created["id"].as_i64().unwrap();

    let update = serde_json::json!({
        "name": "PlayStation 5 Slim",
        "description": "Next-gen console",
        "price": 449.99,
        "imgUrl": "https://example.com/ps5.jpg",
        "categories": [{"id": 2}]
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/products/{id}"))
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&update).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["name"], "PlayStation 5 Slim");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/products/{id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_seeded_product_shrinks_page() {
    let app = spawn_app().await;
    let token = obtain_token(&app, OPERATOR_EMAIL).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/products/25")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = json_body(response).await;
    assert_eq!(json["totalElements"], 24);
}

#[tokio::test]
async fn test_repeated_category_refs_are_collapsed() {
    let app = spawn_app().await;
    let token = obtain_token(&app, OPERATOR_EMAIL).await;

    let payload = serde_json::json!({
        "name": "Mechanical Keyboard",
        "description": "Tenkeyless",
        "price": 129.9,
        "imgUrl": "",
        "categories": [{"id": 3}, {"id": 3}]
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/products")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["categories"].as_array().unwrap().len(), 1);
    assert_eq!(created["categories"][0]["id"], 3);
}

#[tokio::test]
async fn test_update_missing_product_is_not_found() {
    let app = spawn_app().await;
    let token = obtain_token(&app, OPERATOR_EMAIL).await;

    let payload = serde_json::json!({
        "name": "Ghost Product",
        "description": "desc",
        "price": 10.0,
        "imgUrl": "",
        "categories": [{"id": 1}]
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/products/1000")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_product_is_not_found() {
    let app = spawn_app().await;
    let token = obtain_token(&app, OPERATOR_EMAIL).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/products/1000")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_referenced_category_delete_conflicts() {
    let app = spawn_app().await;
    let token = obtain_token(&app, OPERATOR_EMAIL).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/categories/1")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_category_crud() {
    let app = spawn_app().await;
    let token = obtain_token(&app, OPERATOR_EMAIL).await;

    let payload = serde_json::json!({"name": "Games"});

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/categories")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/categories/{id}"))
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"name": "Board Games"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["name"], "Board Games");

    // Nothing references it yet, so deletion goes through.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/categories/{id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_operator_cannot_manage_users() {
    let app = spawn_app().await;
    let token = obtain_token(&app, OPERATOR_EMAIL).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_manages_users() {
    let app = spawn_app().await;
    let token = obtain_token(&app, ADMIN_EMAIL).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users?sort=firstName,asc")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["totalElements"], 2);
    assert_eq!(json["content"][0]["firstName"], "Alex");

    let payload = serde_json::json!({
        "firstName": "Bob",
        "lastName": "Stone",
        "email": "bob@gmail.com",
        "password": "123456",
        "roles": [{"id": 1}]
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["email"], "bob@gmail.com");
    assert_eq!(created["roles"][0]["authority"], "ROLE_OPERATOR");
    assert!(created.get("password").is_none());
    let id = created["id"].as_i64().unwrap();

    // New account can sign in right away.
    let (status, _) = token_response(&app, "bob@gmail.com", "123456").await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/users/{id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_duplicate_email_is_a_field_error() {
    let app = spawn_app().await;
    let token = obtain_token(&app, ADMIN_EMAIL).await;

    let payload = serde_json::json!({
        "firstName": "Copycat",
        "lastName": "Brown",
        "email": OPERATOR_EMAIL,
        "password": "123456",
        "roles": [{"id": 1}]
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = json_body(response).await;
    assert_eq!(json["error"], "Validation exception");
    assert_eq!(json["errors"][0]["fieldName"], "email");
}

#[tokio::test]
async fn test_user_update_keeps_own_email() {
    let app = spawn_app().await;
    let token = obtain_token(&app, ADMIN_EMAIL).await;

    let payload = serde_json::json!({
        "firstName": "Alexander",
        "lastName": "Brown",
        "email": OPERATOR_EMAIL,
        "roles": [{"id": 1}]
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/users/1")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["firstName"], "Alexander");
}

#[tokio::test]
async fn test_invalid_product_payload_reports_fields() {
    let app = spawn_app().await;
    let token = obtain_token(&app, OPERATOR_EMAIL).await;

    let payload = serde_json::json!({
        "name": "",
        "description": "desc",
        "price": -5.0,
        "categories": []
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/products")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = json_body(response).await;
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["fieldName"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"price"));
}
