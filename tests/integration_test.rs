//! Integration tests for the storefront API
//!
//! These tests verify the entire application stack including:
//! - HTTP routing
//! - Request/response handling
//! - Flat-file persistence
//! - Error handling

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

use flatmart::database::{init_db, AppState, ORDERS_FILE};
use flatmart::error::NotifierError;
use flatmart::notifier::{Notification, Notifier};
use flatmart::route::create_app;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl Notifier for RecordingNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifierError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Helper function to create a test application over a temporary data directory
async fn setup_test_app() -> (Router, Arc<RecordingNotifier>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = init_db(temp_dir.path())
        .await
        .expect("Failed to initialize test data directory");
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::new(db, notifier.clone());

    (create_app(state), notifier, temp_dir)
}

/// Helper function to parse response body as JSON
///
/// Extractor rejections answer in plain text; those come back as `Null`.
async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Money and averages travel as decimal strings
fn as_decimal(value: &Value) -> Decimal {
    value.as_str().expect("decimal string").parse().unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, payload: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match payload {
        Some(payload) => {
            request = request.header("content-type", "application/json");
            Body::from(payload.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, response_json(response.into_body()).await)
}

async fn signup(app: &Router, username: &str) -> StatusCode {
    let payload = json!({
        "username": username,
        "password": format!("{username}-pw"),
        "email": format!("{username}@example.com"),
        "phoneNumber": "0501234567",
        "firstName": username,
        "lastName": "Tester"
    });
    send(app, "POST", "/signup", Some(payload)).await.0
}

async fn add_product(app: &Router, id: &str, price: &str, quantity: i64) {
    let payload = json!({
        "id": id,
        "name": format!("Product {id}"),
        "price": price,
        "quantity": quantity,
        "description": "Handmade"
    });
    let (status, _) = send(app, "POST", "/addProduct", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn add_to_cart(app: &Router, username: &str, id: &str, price: &str, quantity: u32) {
    let payload = json!({
        "username": username,
        "item": { "id": id, "title": format!("Product {id}"), "price": price, "quantity": quantity }
    });
    let (status, _) = send(app, "POST", "/addToCart", Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
}

async fn checkout(app: &Router, username: &str) -> (StatusCode, Value) {
    let payload = json!({
        "username": username,
        "address": "1 Palm St",
        "city": "Dubai",
        "country": "UAE"
    });
    send(app, "POST", "/createOrder", Some(payload)).await
}

#[tokio::test]
async fn test_signup_and_login() {
    let (app, _notifier, _temp_dir) = setup_test_app().await;

    assert_eq!(signup(&app, "boss").await, StatusCode::CREATED);
    assert_eq!(signup(&app, "alice").await, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        Some(json!({ "username": "alice", "password": "alice-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["isAdmin"], false);
    assert_eq!(body["profile"]["email"], "alice@example.com");
    assert!(body["profile"].get("password").is_none());

    let (_, body) = send(
        &app,
        "POST",
        "/login",
        Some(json!({ "username": "boss", "password": "boss-pw" })),
    )
    .await;
    assert_eq!(body["isAdmin"], true);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let (app, _notifier, _temp_dir) = setup_test_app().await;
    signup(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        Some(json!({ "username": "alice", "password": "nope" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_duplicate_signup() {
    let (app, _notifier, _temp_dir) = setup_test_app().await;

    assert_eq!(signup(&app, "alice").await, StatusCode::CREATED);
    assert_eq!(signup(&app, "alice").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_profile_update_and_lookup() {
    let (app, _notifier, _temp_dir) = setup_test_app().await;
    signup(&app, "boss").await;
    signup(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/updateProfile",
        Some(json!({
            "originalUsername": "alice",
            "newUsername": "alicia",
            "email": "",
            "firstName": "Alicia"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["username"], "alicia");
    assert_eq!(body["profile"]["email"], "alice@example.com");

    let (status, body) = send(&app, "GET", "/profile/alicia", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userData"]["firstName"], "Alicia");

    let (status, _) = send(&app, "GET", "/profile/alice", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/updateProfile",
        Some(json!({ "originalUsername": "alicia", "newUsername": "boss" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_check_username_before_rename() {
    let (app, _notifier, _temp_dir) = setup_test_app().await;
    signup(&app, "boss").await;
    signup(&app, "alice").await;

    let check = |username: &str, original: &str| {
        Some(json!({ "username": username, "originalUsername": original }))
    };

    let (status, body) = send(&app, "POST", "/checkUsername", check("boss", "alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Username already exists.");

    let (status, body) = send(&app, "POST", "/checkUsername", check("alice", "alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, "POST", "/checkUsername", check("alicia", "alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let (app, notifier, _temp_dir) = setup_test_app().await;
    signup(&app, "alice").await;

    let (status, _) = send(
        &app,
        "POST",
        "/forgot-password",
        Some(json!({ "email": "alice@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notifier.sent.lock().unwrap()[0].subject(), "Password Reset Request");

    let (status, _) = send(
        &app,
        "POST",
        "/reset-password/alice@example.com",
        Some(json!({ "newPassword": "fresh-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/login",
        Some(json!({ "username": "alice", "password": "fresh-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/forgot-password",
        Some(json!({ "email": "nobody@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_catalogue_crud() {
    let (app, _notifier, _temp_dir) = setup_test_app().await;
    add_product(&app, "102-001", "200", 3).await;
    add_product(&app, "101-001", "49.99", 5).await;

    let (status, body) = send(&app, "GET", "/products", None).await;
    assert_eq!(status, StatusCode::OK);
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["id"], "101-001");
    assert_eq!(products[0]["averageRating"], Value::Null);

    let (status, _) = send(
        &app,
        "POST",
        "/editProduct",
        Some(json!({ "id": "101-001", "quantity": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/product/101-001", None).await;
    assert_eq!(body["quantity"], 9);
    assert_eq!(body["price"], "49.99");

    let (status, _) = send(
        &app,
        "DELETE",
        "/deleteProduct",
        Some(json!({ "productId": "101-001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/product/101-001", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_duplicate_product() {
    let (app, _notifier, _temp_dir) = setup_test_app().await;
    add_product(&app, "101-001", "10", 1).await;

    let payload = json!({
        "id": "101-001",
        "name": "Again",
        "price": "11",
        "quantity": 1,
        "description": ""
    });
    let (status, body) = send(&app, "POST", "/addProduct", Some(payload)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_cart_operations() {
    let (app, _notifier, _temp_dir) = setup_test_app().await;
    add_to_cart(&app, "alice", "101-001", "10", 1).await;
    add_to_cart(&app, "alice", "102-001", "5", 1).await;

    let item = json!({ "username": "alice", "itemId": "101-001" });
    let (status, body) = send(&app, "POST", "/cart/increment", Some(item.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["quantity"], 2);

    send(&app, "POST", "/cart/decrement", Some(item.clone())).await;
    let (_, body) = send(&app, "POST", "/cart/decrement", Some(item.clone())).await;
    assert_eq!(body["item"]["quantity"], 1);

    let (status, _) = send(&app, "POST", "/cart/delete", Some(item.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/cart/delete", Some(item)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/cart/alice", None).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "102-001");

    let (status, _) = send(
        &app,
        "POST",
        "/cart/increment",
        Some(json!({ "username": "alice", "itemId": "999-999" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_place_order_end_to_end() {
    let (app, notifier, _temp_dir) = setup_test_app().await;
    signup(&app, "boss").await;
    signup(&app, "alice").await;
    add_product(&app, "104-001", "49.99", 5).await;
    add_to_cart(&app, "alice", "104-001", "49.99", 1).await;
    add_to_cart(&app, "alice", "104-001", "49.99", 1).await;

    let (status, body) = checkout(&app, "alice").await;
    assert_eq!(status, StatusCode::CREATED);
    let order = &body["order"];
    assert_eq!(order["orderID"], "201-0001");
    assert_eq!(order["status"], "Pending");
    assert_eq!(as_decimal(&order["totalPrice"]), "99.98".parse::<Decimal>().unwrap());
    assert_eq!(order["address"], "1 Palm St, Dubai, UAE");
    assert_eq!(order["products"], json!([{ "productId": "104-001", "quantity": 2 }]));

    let (_, body) = send(&app, "GET", "/product/104-001", None).await;
    assert_eq!(body["quantity"], 3);

    let (_, body) = send(&app, "GET", "/cart/alice", None).await;
    assert_eq!(body, json!([]));

    let (_, body) = send(&app, "GET", "/orders/alice", None).await;
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["products"][0]["name"], "Product 104-001");

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject(), "Order Confirmation");
}

#[tokio::test]
async fn test_place_order_with_empty_cart() {
    let (app, _notifier, temp_dir) = setup_test_app().await;

    let (status, body) = checkout(&app, "alice").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let orders = std::fs::read_to_string(temp_dir.path().join(ORDERS_FILE)).unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_order_status_updates() {
    let (app, notifier, _temp_dir) = setup_test_app().await;
    signup(&app, "alice").await;
    add_product(&app, "101-001", "10", 5).await;
    add_to_cart(&app, "alice", "101-001", "10", 1).await;
    checkout(&app, "alice").await;

    let update = json!({ "orderID": "201-0001", "newStatus": "Shipped" });
    let (status, body) = send(&app, "POST", "/updateOrderStatus", Some(update.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "Shipped");
    send(&app, "POST", "/updateOrderStatus", Some(update)).await;

    let subjects: Vec<&str> = notifier
        .sent
        .lock()
        .unwrap()
        .iter()
        .map(Notification::subject)
        .collect();
    assert_eq!(subjects, vec!["Order Confirmation", "Order Shipped"]);

    let (status, _) = send(
        &app,
        "POST",
        "/updateOrderStatus",
        Some(json!({ "orderID": "201-0042", "newStatus": "Delivered" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/updateOrderStatus",
        Some(json!({ "orderID": "201-0001", "newStatus": "Lost" })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_ratings_feed_product_average() {
    let (app, _notifier, _temp_dir) = setup_test_app().await;
    add_product(&app, "101-001", "10", 5).await;

    for (username, score) in [("alice", 4), ("bob", 5), ("alice", 3)] {
        let (status, _) = send(
            &app,
            "POST",
            "/submitRating",
            Some(json!({ "username": username, "productId": "101-001", "rating": score })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, "GET", "/product/101-001", None).await;
    assert_eq!(as_decimal(&body["averageRating"]), Decimal::from(4));

    let (status, _) = send(
        &app,
        "POST",
        "/submitRating",
        Some(json!({ "username": "alice", "productId": "999-999", "rating": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analytics_report() {
    let (app, _notifier, _temp_dir) = setup_test_app().await;

    let (status, body) = send(&app, "GET", "/analytics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analytics"]["orderCount"], 0);
    assert_eq!(body["analytics"]["aov"], Value::Null);
    assert_eq!(body["analytics"]["bestRatedProduct"]["status"], "no_data");

    add_product(&app, "101-001", "100", 10).await;
    add_to_cart(&app, "alice", "101-001", "100", 1).await;
    checkout(&app, "alice").await;
    add_to_cart(&app, "alice", "101-001", "100", 3).await;
    checkout(&app, "alice").await;

    let (_, body) = send(&app, "GET", "/analytics", None).await;
    let analytics = &body["analytics"];
    assert_eq!(analytics["orderCount"], 2);
    assert_eq!(as_decimal(&analytics["aov"]), Decimal::from(200));
    assert_eq!(analytics["highestTotalPriceOrder"]["orderID"], "201-0002");
    assert_eq!(analytics["salesByCategory"][0]["label"], "Men");
    assert_eq!(analytics["salesByCategory"][0]["totalQuantity"], 4);
}

#[tokio::test]
async fn test_admin_user_management() {
    let (app, _notifier, _temp_dir) = setup_test_app().await;
    signup(&app, "boss").await;
    signup(&app, "alice").await;

    let (_, body) = send(&app, "GET", "/users", None).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, "DELETE", "/deleteUser", Some(json!({ "username": "boss" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", "/deleteAccount", Some(json!({ "username": "alice" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", "/deleteUser", Some(json!({ "username": "alice" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
