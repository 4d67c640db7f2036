//! Operations spanning more than one table
//!
//! Order placement is the heart of the store: it turns a cart into an order,
//! takes the ordered units out of stock and empties the cart. The three
//! files are locked in the global order products → orders → cart and
//! written in that same order, so a failure never loses a stored order while
//! the cart is already gone.

use std::collections::HashMap;

use chrono::Local;

use crate::analytics::{compute_analytics, AnalyticsReport};
use crate::database::Database;
use crate::error::{StoreError, StoreResult};
use crate::model::{
    flatten_free_text, validate_field, Order, OrderLine, OrderLineView, OrderStatus, OrderView,
    ProductView, Rating, RatingRequest,
};
use crate::notifier::{dispatch, Notification, Notifier, OrderEvent, Recipient};
use crate::repository::{average_ratings, next_order_id};

/// Name shown for order lines whose product left the catalogue
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Turns the user's cart into a pending order
///
/// Fails with [`StoreError::EmptyCart`] or a validation error (missing
/// address, not enough stock) before anything is written. Cart lines whose
/// product is no longer in the catalogue are still ordered; their stock
/// decrement is skipped.
pub async fn place_order(
    db: &Database,
    notifier: &dyn Notifier,
    username: &str,
    address: &str,
) -> StoreResult<Order> {
    let address = flatten_free_text(address).trim().to_string();
    if address.is_empty() {
        return Err(StoreError::validation("address is required"));
    }

    let mut products_table = db.products.lock().await;
    let mut orders_table = db.orders.lock().await;
    let mut cart_file = db.carts.lock(username).await?;

    let cart = cart_file.load().await?;
    if cart.is_empty() {
        return Err(StoreError::EmptyCart);
    }
    let total_price = cart.total()?;

    let mut products = products_table.load().await?;
    let mut orders = orders_table.load().await?;

    for item in &cart.items {
        let ordered = i64::from(item.quantity);
        match products.iter_mut().find(|product| product.id == item.id) {
            Some(product) if product.quantity < ordered => {
                return Err(StoreError::validation(format!(
                    "insufficient stock for product `{}`: {} left, {} ordered",
                    product.id, product.quantity, ordered
                )));
            }
            Some(product) => product.quantity -= ordered,
            None => tracing::warn!(
                product_id = %item.id,
                username,
                "Ordered product is not in the catalogue; stock left untouched"
            ),
        }
    }

    let order = Order {
        order_id: next_order_id(&orders),
        username: username.to_string(),
        order_date: Local::now().date_naive(),
        total_price,
        status: OrderStatus::Pending,
        address,
        products: cart
            .items
            .iter()
            .map(|item| OrderLine {
                product_id: item.id.clone(),
                quantity: item.quantity,
            })
            .collect(),
    };

    let catalogue_before = products_table.snapshot().await?;
    products_table.store(&products).await?;

    orders.push(order.clone());
    if let Err(err) = orders_table.store(&orders).await {
        if let Err(restore_err) = products_table.restore(&catalogue_before).await {
            tracing::error!(
                order_id = %order.order_id,
                error = %restore_err,
                "Order was not stored and stock could not be restored"
            );
        }
        return Err(err);
    }

    if let Err(err) = cart_file.clear().await {
        tracing::error!(
            order_id = %order.order_id,
            username,
            error = %err,
            "Order stored but the cart could not be cleared"
        );
    }

    drop(cart_file);
    drop(orders_table);
    drop(products_table);

    tracing::info!(
        order_id = %order.order_id,
        username,
        total_price = %order.total_price,
        "Order placed"
    );
    notify_order(db, notifier, OrderEvent::Created, &order).await;

    Ok(order)
}

/// Sets an order's status; any transition is allowed
///
/// Moving to `Shipped` or `Delivered` notifies the customer, but only when
/// the status actually changed.
pub async fn update_order_status(
    db: &Database,
    notifier: &dyn Notifier,
    order_id: &str,
    status: OrderStatus,
) -> StoreResult<Order> {
    let (previous, order) = db.orders.update_status(order_id, status).await?;

    if previous != status {
        tracing::info!(order_id, from = %previous, to = %status, "Order status changed");
        if let Some(event) = OrderEvent::for_status(status) {
            notify_order(db, notifier, event, &order).await;
        }
    }

    Ok(order)
}

async fn notify_order(db: &Database, notifier: &dyn Notifier, event: OrderEvent, order: &Order) {
    match db.users.find(&order.username).await {
        Ok(user) => dispatch(
            notifier,
            Notification::Order {
                event,
                recipient: Recipient::from(&user),
                order: order.clone(),
            },
        ),
        Err(err) => tracing::warn!(
            order_id = %order.order_id,
            username = %order.username,
            error = %err,
            "No recipient for order notification"
        ),
    }
}

/// Emits a password-reset notification for the account behind `email`
pub async fn request_password_reset(
    db: &Database,
    notifier: &dyn Notifier,
    email: &str,
) -> StoreResult<()> {
    let user = db.users.find_by_email(email).await?;
    dispatch(
        notifier,
        Notification::PasswordResetRequested {
            recipient: Recipient::from(&user),
        },
    );
    Ok(())
}

/// Records a user's score, snapshotting the product's current name
pub async fn submit_rating(db: &Database, request: RatingRequest) -> StoreResult<Rating> {
    validate_field("username", &request.username)?;
    let product = db.products.find(&request.product_id).await?;

    let rating = Rating {
        username: request.username,
        product_id: product.id,
        product_name: product.name,
        rating: request.rating,
    };
    db.ratings.upsert(rating.clone()).await?;
    Ok(rating)
}

/// Catalogue with derived average ratings
pub async fn list_products(db: &Database) -> StoreResult<Vec<ProductView>> {
    let products = db.products.load_all().await?;
    let averages = average_ratings(&db.ratings.load_all().await?);

    Ok(products
        .into_iter()
        .map(|product| ProductView {
            average_rating: averages.get(&product.id).copied(),
            product,
        })
        .collect())
}

pub async fn get_product(db: &Database, id: &str) -> StoreResult<ProductView> {
    let product = db.products.find(id).await?;
    let averages = average_ratings(&db.ratings.load_all().await?);
    Ok(ProductView {
        average_rating: averages.get(&product.id).copied(),
        product,
    })
}

/// Orders with product names resolved, optionally for one user only
pub async fn list_orders(db: &Database, username: Option<&str>) -> StoreResult<Vec<OrderView>> {
    let names: HashMap<String, String> = db
        .products
        .load_all()
        .await?
        .into_iter()
        .map(|product| (product.id, product.name))
        .collect();
    let orders = match username {
        Some(username) => db.orders.for_user(username).await?,
        None => db.orders.load_all().await?,
    };

    Ok(orders
        .into_iter()
        .map(|order| OrderView {
            products: order
                .products
                .iter()
                .map(|line| OrderLineView {
                    name: names
                        .get(&line.product_id)
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
                    id: line.product_id.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            order_id: order.order_id,
            username: order.username,
            order_date: order.order_date,
            total_price: order.total_price,
            status: order.status,
            address: order.address,
        })
        .collect())
}

/// Fresh analytics over the current contents of every table
pub async fn analytics(db: &Database) -> StoreResult<AnalyticsReport> {
    let orders = db.orders.load_all().await?;
    let products = db.products.load_all().await?;
    let ratings = db.ratings.load_all().await?;
    Ok(compute_analytics(&orders, &products, &ratings))
}
