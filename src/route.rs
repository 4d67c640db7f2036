//! Route definitions for the storefront API
//!
//! Paths match the ones the browser client already calls. Admin console
//! routes sit behind [`admin_middleware`].

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::database::AppState;
use crate::handler::{
    add_product, add_to_cart, check_username, create_order, decrement_cart_item, delete_account,
    delete_cart_item, delete_product, delete_user, edit_product, forgot_password, get_analytics,
    get_cart, get_product, get_profile, increment_cart_item, list_orders, list_products,
    list_users, login, reset_password, signup, submit_rating, update_order_status,
    update_profile, user_orders,
};
use crate::middleware::admin_middleware;

/// Creates and configures the application router
///
/// # Route Definitions
///
/// Account: `POST /login`, `POST /signup`, `POST /forgot-password`,
/// `POST /reset-password/{email}`, `GET /profile/{username}`,
/// `POST /checkUsername`, `POST /updateProfile`, `DELETE /deleteAccount`
///
/// Shop: `GET /products`, `GET /product/{id}`, `GET /cart/{username}`,
/// `POST /addToCart`, `POST /cart/increment`, `POST /cart/decrement`,
/// `POST /cart/delete`, `POST /createOrder`, `GET /orders/{username}`,
/// `POST /submitRating`
///
/// Admin: `GET /users`, `DELETE /deleteUser`, `POST /addProduct`,
/// `POST /editProduct`, `DELETE /deleteProduct`, `GET /orders`,
/// `POST /updateOrderStatus`, `GET /analytics`
pub fn create_app(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/users", get(list_users))
        .route("/deleteUser", delete(delete_user))
        .route("/addProduct", post(add_product))
        .route("/editProduct", post(edit_product))
        .route("/deleteProduct", delete(delete_product))
        .route("/orders", get(list_orders))
        .route("/updateOrderStatus", post(update_order_status))
        .route("/analytics", get(get_analytics))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/{email}", post(reset_password))
        .route("/profile/{username}", get(get_profile))
        .route("/checkUsername", post(check_username))
        .route("/updateProfile", post(update_profile))
        .route("/deleteAccount", delete(delete_account))
        .route("/products", get(list_products))
        .route("/product/{id}", get(get_product))
        .route("/cart/{username}", get(get_cart))
        .route("/addToCart", post(add_to_cart))
        .route("/cart/increment", post(increment_cart_item))
        .route("/cart/decrement", post(decrement_cart_item))
        .route("/cart/delete", post(delete_cart_item))
        .route("/createOrder", post(create_order))
        .route("/orders/{username}", get(user_orders))
        .route("/submitRating", post(submit_rating))
        .merge(admin_routes)
        .with_state(state)
}
