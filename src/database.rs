//! Data directory initialization and shared application state
//!
//! The "database" is a directory of flat-text tables. This module opens it,
//! creates any missing table files, and bundles one repository per table.

use std::path::Path;
use std::sync::Arc;

use crate::error::StoreResult;
use crate::notifier::Notifier;
use crate::repository::{Carts, Orders, Products, Ratings, Users};
use crate::storage::TextFile;

/// Users table, one line per account
pub const USERS_FILE: &str = "users.txt";

/// Product catalogue, blank-line-separated blocks
pub const PRODUCTS_FILE: &str = "products.txt";

/// Order log, blank-line-separated blocks
pub const ORDERS_FILE: &str = "orders.txt";

/// Ratings log, one line per `(user, product)`
pub const RATINGS_FILE: &str = "ratings.txt";

/// Every repository over one data directory
///
/// Lock order for operations spanning several tables:
/// products → orders → cart. Users and ratings are only ever locked alone.
pub struct Database {
    pub users: Users,
    pub products: Products,
    pub carts: Carts,
    pub orders: Orders,
    pub ratings: Ratings,
}

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub notifier: Arc<dyn Notifier>,
    /// Shared secret required on admin routes, when configured
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db: Arc::new(db),
            notifier,
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.filter(|token| !token.is_empty());
        self
    }
}

/// Opens the data directory, creating it and any missing table files
///
/// # Example
///
/// ```no_run
/// # async fn run() -> Result<(), flatmart::error::StoreError> {
/// let db = flatmart::database::init_db("data").await?;
/// # Ok(()) }
/// ```
pub async fn init_db(data_dir: impl AsRef<Path>) -> StoreResult<Database> {
    let data_dir = data_dir.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&data_dir).await?;

    for name in [USERS_FILE, PRODUCTS_FILE, ORDERS_FILE, RATINGS_FILE] {
        TextFile::new(data_dir.join(name)).touch().await?;
    }

    Ok(Database {
        users: Users::new(data_dir.join(USERS_FILE)),
        products: Products::new(data_dir.join(PRODUCTS_FILE)),
        carts: Carts::new(&data_dir),
        orders: Orders::new(data_dir.join(ORDERS_FILE)),
        ratings: Ratings::new(data_dir.join(RATINGS_FILE)),
    })
}
