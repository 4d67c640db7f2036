//! Data models for the storefront
//!
//! This module defines the decoded entities (users, products, cart items,
//! orders, ratings) together with the request/response payloads exchanged
//! with the browser client. JSON field names are camelCase to stay compatible
//! with the existing client.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Rounds a currency or average value to 2 decimal places, midpoint away from zero
///
/// Every 2-dp figure reported by the core goes through this function.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rejects values that cannot be stored in a tab-separated scalar field
pub fn validate_field(field: &str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(format!("{field} is required")));
    }
    if value.contains(['\t', '\r', '\n']) {
        return Err(StoreError::validation(format!(
            "{field} must not contain tabs or line breaks"
        )));
    }
    Ok(())
}

/// Product and cart item ids also frame order lines as `id(quantity)`
pub fn validate_id(field: &str, value: &str) -> StoreResult<()> {
    validate_field(field, value)?;
    if value.contains(['(', ')']) {
        return Err(StoreError::validation(format!(
            "{field} must not contain parentheses"
        )));
    }
    Ok(())
}

/// Usernames name the per-user cart file, so path syntax is refused
pub fn validate_username(username: &str) -> StoreResult<()> {
    validate_field("username", username)?;
    if username.contains(['/', '\\']) || username.contains("..") {
        return Err(StoreError::validation(
            "username must not contain path separators",
        ));
    }
    Ok(())
}

/// Flattens free text so it survives the line/tab framing of the record format
///
/// Line breaks and tabs become single spaces, which is exactly what the codec
/// produces when it reads a multi-line field back. Surrounding whitespace is
/// dropped; a blank description line would read back as a block separator.
pub fn flatten_free_text(value: &str) -> String {
    value
        .lines()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\t', " ")
        .trim()
        .to_string()
}

/// Account role
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Customer => "customer",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

/// A registered account, as stored in the users table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn profile(&self) -> Profile {
        Profile {
            username: self.username.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
        }
    }
}

/// Public view of a user (never carries the password)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// A catalogue entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// `<category>-<subcategory><sequence>`, e.g. `101-001`
    pub id: String,
    pub name: String,
    pub price: Decimal,
    /// Units in stock
    pub quantity: i64,
    #[serde(default)]
    pub description: String,
}

impl Product {
    pub fn validate(&self) -> StoreResult<()> {
        validate_id("id", &self.id)?;
        validate_field("name", &self.name)?;
        if self.price.is_sign_negative() {
            return Err(StoreError::validation("price must not be negative"));
        }
        if self.quantity < 0 {
            return Err(StoreError::validation("quantity must not be negative"));
        }
        Ok(())
    }

    pub fn category(&self) -> &str {
        category_of(&self.id)
    }
}

/// Category key of a product id: everything before the first `-`
pub fn category_of(product_id: &str) -> &str {
    product_id.split('-').next().unwrap_or(product_id)
}

/// Display label for the well-known category keys
pub fn category_label(category: &str) -> Option<&'static str> {
    match category {
        "101" => Some("Men"),
        "102" => Some("Women"),
        "103" => Some("Kids"),
        _ => None,
    }
}

/// Partial product edit; missing fields keep their stored value
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProductUpdate {
    pub id: String,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
    pub description: Option<String>,
}

/// Product plus its derived average rating
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// `None` when nobody has rated the product yet
    pub average_rating: Option<Decimal>,
}

/// A line in a user's cart
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    /// Product id (not checked against the catalogue)
    pub id: String,
    pub title: String,
    /// Unit price captured when the item was added
    pub price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    pub fn validate(&self) -> StoreResult<()> {
        validate_id("item id", &self.id)?;
        validate_field("title", &self.title)?;
        if self.quantity == 0 {
            return Err(StoreError::validation("quantity must be at least 1"));
        }
        if self.price.is_sign_negative() {
            return Err(StoreError::validation("price must not be negative"));
        }
        Ok(())
    }

    /// `price × quantity`; fails instead of overflowing
    pub fn line_total(&self) -> StoreResult<Decimal> {
        self.price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| {
                StoreError::validation(format!("line total of item `{}` is out of range", self.id))
            })
    }
}

/// A user's cart file: owner line plus items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub username: String,
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn empty(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> StoreResult<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |total, item| {
            total
                .checked_add(item.line_total()?)
                .ok_or_else(|| StoreError::validation("cart total is out of range"))
        })
    }
}

/// Order lifecycle state
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            other => Err(format!("unknown order status `{other}`")),
        }
    }
}

/// One `(productId, quantity)` pair of an order
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
}

/// A placed order
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub username: String,
    pub order_date: NaiveDate,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub address: String,
    pub products: Vec<OrderLine>,
}

/// Order as shown to users and admins, with product names resolved
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub username: String,
    pub order_date: NaiveDate,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub address: String,
    pub products: Vec<OrderLineView>,
}

#[derive(Serialize, Debug, Clone)]
pub struct OrderLineView {
    pub id: String,
    pub name: String,
    pub quantity: u32,
}

/// A user's score for a product
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub username: String,
    pub product_id: String,
    /// Product name at the time of rating
    pub product_name: String,
    pub rating: i64,
}

/// Login payload
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub is_admin: bool,
    pub profile: Profile,
}

/// Signup payload
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Profile edit; empty or missing fields keep their stored value
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub original_username: String,
    pub new_username: Option<String>,
    pub new_password: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Rename pre-check; keeping the current name is always allowed
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUsernameRequest {
    pub username: String,
    #[serde(default)]
    pub original_username: String,
}

#[derive(Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteProductRequest {
    pub product_id: String,
}

#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub username: String,
    pub item: CartItem,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub username: String,
    pub item_id: String,
}

/// Checkout payload; the stored address is `"address, city, country"`
#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub username: String,
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

impl CreateOrderRequest {
    pub fn full_address(&self) -> String {
        [&self.address, &self.city, &self.country]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub new_status: OrderStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub username: String,
    pub product_id: String,
    pub rating: i64,
}
