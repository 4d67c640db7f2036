use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};
use crate::model::{Order, OrderStatus};
use crate::storage::{TableFile, TableGuard};

/// Prefix shared by every order id
pub const ORDER_ID_PREFIX: &str = "201-";

/// The order log (`orders.txt`)
pub struct Orders {
    table: TableFile<Order>,
}

impl Orders {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            table: TableFile::new(path),
        }
    }

    /// Exclusive access for order placement
    pub async fn lock(&self) -> TableGuard<'_, Order> {
        self.table.lock().await
    }

    pub async fn load_all(&self) -> StoreResult<Vec<Order>> {
        self.table.load_all().await
    }

    pub async fn find(&self, order_id: &str) -> StoreResult<Order> {
        self.load_all()
            .await?
            .into_iter()
            .find(|order| order.order_id == order_id)
            .ok_or_else(|| StoreError::not_found(format!("order `{order_id}`")))
    }

    pub async fn for_user(&self, username: &str) -> StoreResult<Vec<Order>> {
        let mut orders = self.load_all().await?;
        orders.retain(|order| order.username == username);
        Ok(orders)
    }

    /// Overwrites an order's status in place
    ///
    /// Any transition is accepted. Returns the previous status with the
    /// updated order.
    pub async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> StoreResult<(OrderStatus, Order)> {
        let mut table = self.table.lock().await;
        let mut orders = table.load().await?;

        let order = orders
            .iter_mut()
            .find(|order| order.order_id == order_id)
            .ok_or_else(|| StoreError::not_found(format!("order `{order_id}`")))?;
        let previous = order.status;
        order.status = status;
        let updated = order.clone();

        if previous != status {
            table.store(&orders).await?;
        }
        Ok((previous, updated))
    }
}

/// Allocates the id following the highest existing `201-NNNN` id
pub fn next_order_id(orders: &[Order]) -> String {
    let last = orders
        .iter()
        .filter_map(|order| order.order_id.strip_prefix(ORDER_ID_PREFIX))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{ORDER_ID_PREFIX}{:04}", last + 1)
}
