//! HTTP request handlers for the storefront API
//!
//! Handlers are thin: they decode the JSON payload, call a repository or the
//! coordinator, and wrap the outcome. Every failure comes back as a
//! [`StoreError`], which renders its own status code and message.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::coordinator;
use crate::database::AppState;
use crate::error::StoreError;
use crate::model::{
    AddToCartRequest, CartItemRequest, CheckUsernameRequest, CreateOrderRequest, DeleteProductRequest,
    ForgotPasswordRequest, LoginRequest, LoginResponse, Product, ProductUpdate, Profile,
    ProfileUpdate, RatingRequest, ResetPasswordRequest, SignupRequest, UpdateStatusRequest,
    UsernameRequest,
};

type HandlerResult = Result<axum::response::Response, StoreError>;

fn ok(message: &str) -> axum::response::Response {
    Json(json!({ "success": true, "message": message })).into_response()
}

/// Checks plaintext credentials
///
/// # Response
///
/// - **200 OK** - `{ "success": true, "isAdmin": bool, "profile": {...} }`
/// - **401 Unauthorized** - Unknown user or wrong password
pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> HandlerResult {
    let user = state
        .db
        .users
        .authenticate(&payload.username, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        is_admin: user.is_admin(),
        profile: user.profile(),
    })
    .into_response())
}

/// Registers a new account
///
/// # Response
///
/// - **201 Created** - Account stored
/// - **409 Conflict** - Username or email already registered
pub async fn signup(State(state): State<AppState>, Json(payload): Json<SignupRequest>) -> HandlerResult {
    let user = state.db.users.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User signed up successfully.",
            "profile": user.profile()
        })),
    )
        .into_response())
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> HandlerResult {
    coordinator::request_password_reset(&state.db, state.notifier.as_ref(), &payload.email).await?;
    Ok(ok("Password reset link sent."))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> HandlerResult {
    state
        .db
        .users
        .reset_password(&email, &payload.new_password)
        .await?;
    Ok(ok("Password reset successful."))
}

pub async fn get_profile(State(state): State<AppState>, Path(username): Path<String>) -> HandlerResult {
    let user = state.db.users.find(&username).await?;
    Ok(Json(json!({ "success": true, "userData": user.profile() })).into_response())
}

pub async fn update_profile(
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdate>,
) -> HandlerResult {
    let user = state.db.users.update_profile(payload).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully.",
        "profile": user.profile()
    }))
    .into_response())
}

/// Tells the profile screen whether a new username is free
///
/// # Response
///
/// - **200 OK** - `{ "success": true }`, or `{ "success": false, "message": ... }`
///   when another account already uses the name
pub async fn check_username(
    State(state): State<AppState>,
    Json(payload): Json<CheckUsernameRequest>,
) -> HandlerResult {
    if payload.username != payload.original_username
        && state.db.users.username_exists(&payload.username).await?
    {
        return Ok(Json(json!({
            "success": false,
            "message": "Username already exists."
        }))
        .into_response());
    }
    Ok(Json(json!({ "success": true })).into_response())
}

/// Self-service account removal
pub async fn delete_account(
    State(state): State<AppState>,
    Json(payload): Json<UsernameRequest>,
) -> HandlerResult {
    state.db.users.delete(&payload.username).await?;
    Ok(ok("Account deleted successfully."))
}

/// Admin: every account, without passwords
pub async fn list_users(State(state): State<AppState>) -> HandlerResult {
    let users: Vec<Profile> = state
        .db
        .users
        .load_all()
        .await?
        .iter()
        .map(|user| user.profile())
        .collect();
    Ok(Json(json!({ "success": true, "users": users })).into_response())
}

/// Admin: remove an account
pub async fn delete_user(
    State(state): State<AppState>,
    Json(payload): Json<UsernameRequest>,
) -> HandlerResult {
    state.db.users.delete(&payload.username).await?;
    Ok(ok("User deleted successfully."))
}

/// Catalogue with average ratings
pub async fn list_products(State(state): State<AppState>) -> HandlerResult {
    let products = coordinator::list_products(&state.db).await?;
    Ok(Json(json!({ "success": true, "products": products })).into_response())
}

pub async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult {
    let product = coordinator::get_product(&state.db, &id).await?;
    Ok(Json(product).into_response())
}

/// Admin: add a catalogue entry
///
/// # Response
///
/// - **201 Created** - Product stored, catalogue re-sorted by id
/// - **409 Conflict** - Product id already exists
pub async fn add_product(State(state): State<AppState>, Json(payload): Json<Product>) -> HandlerResult {
    let product = state.db.products.insert(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Product added successfully.",
            "product": product
        })),
    )
        .into_response())
}

/// Admin: overwrite fields of an existing product
pub async fn edit_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductUpdate>,
) -> HandlerResult {
    let product = state.db.products.update(payload).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Product updated successfully.",
        "product": product
    }))
    .into_response())
}

/// Admin: remove a catalogue entry
pub async fn delete_product(
    State(state): State<AppState>,
    Json(payload): Json<DeleteProductRequest>,
) -> HandlerResult {
    state.db.products.delete(&payload.product_id).await?;
    Ok(ok("Product deleted successfully."))
}

pub async fn get_cart(State(state): State<AppState>, Path(username): Path<String>) -> HandlerResult {
    let cart = state.db.carts.get(&username).await?;
    Ok(Json(cart.items).into_response())
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    Json(payload): Json<AddToCartRequest>,
) -> HandlerResult {
    state.db.carts.add_item(&payload.username, payload.item).await?;
    Ok(ok("Item added to cart successfully."))
}

pub async fn increment_cart_item(
    State(state): State<AppState>,
    Json(payload): Json<CartItemRequest>,
) -> HandlerResult {
    let item = state
        .db
        .carts
        .adjust_quantity(&payload.username, &payload.item_id, 1)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Cart updated successfully.", "item": item })).into_response())
}

/// Decrements an item's quantity; it never drops below 1
pub async fn decrement_cart_item(
    State(state): State<AppState>,
    Json(payload): Json<CartItemRequest>,
) -> HandlerResult {
    let item = state
        .db
        .carts
        .adjust_quantity(&payload.username, &payload.item_id, -1)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Cart updated successfully.", "item": item })).into_response())
}

/// Removes an item; removing an absent item still succeeds
pub async fn delete_cart_item(
    State(state): State<AppState>,
    Json(payload): Json<CartItemRequest>,
) -> HandlerResult {
    match state
        .db
        .carts
        .remove_item(&payload.username, &payload.item_id)
        .await
    {
        Ok(()) => {}
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err),
    }
    Ok(ok("Item deleted successfully."))
}

/// Places an order from the user's cart
///
/// # Response
///
/// - **201 Created** - Order stored, stock decremented, cart emptied
/// - **400 Bad Request** - Empty cart, missing address or insufficient stock
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> HandlerResult {
    let order = coordinator::place_order(
        &state.db,
        state.notifier.as_ref(),
        &payload.username,
        &payload.full_address(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order created successfully.",
            "order": order
        })),
    )
        .into_response())
}

pub async fn user_orders(State(state): State<AppState>, Path(username): Path<String>) -> HandlerResult {
    let orders = coordinator::list_orders(&state.db, Some(&username)).await?;
    Ok(Json(json!({ "success": true, "orders": orders })).into_response())
}

/// Admin: every order
pub async fn list_orders(State(state): State<AppState>) -> HandlerResult {
    let orders = coordinator::list_orders(&state.db, None).await?;
    Ok(Json(json!({ "success": true, "orders": orders })).into_response())
}

/// Admin: set an order's status
pub async fn update_order_status(
    State(state): State<AppState>,
    Json(payload): Json<UpdateStatusRequest>,
) -> HandlerResult {
    let order = coordinator::update_order_status(
        &state.db,
        state.notifier.as_ref(),
        &payload.order_id,
        payload.new_status,
    )
    .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Order status updated successfully.",
        "order": order
    }))
    .into_response())
}

pub async fn submit_rating(
    State(state): State<AppState>,
    Json(payload): Json<RatingRequest>,
) -> HandlerResult {
    let rating = coordinator::submit_rating(&state.db, payload).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Rating submitted successfully.",
        "rating": rating
    }))
    .into_response())
}

/// Admin: sales analytics, recomputed on every call
pub async fn get_analytics(State(state): State<AppState>) -> HandlerResult {
    let analytics = coordinator::analytics(&state.db).await?;
    Ok(Json(json!({ "success": true, "analytics": analytics })).into_response())
}
