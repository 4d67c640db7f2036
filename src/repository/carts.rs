use std::path::PathBuf;

use tokio::sync::OwnedMutexGuard;

use crate::codec::{decode_cart, encode_cart};
use crate::error::{StoreError, StoreResult};
use crate::model::{validate_username, Cart, CartItem};
use crate::storage::{KeyedLocks, TextFile};

/// Per-user cart files, `"<username>'s Cart Details.txt"` in the data directory
pub struct Carts {
    dir: PathBuf,
    locks: KeyedLocks,
}

impl Carts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: KeyedLocks::new(),
        }
    }

    /// Exclusive access to one user's cart
    ///
    /// Carts of different users lock independently.
    pub async fn lock(&self, username: &str) -> StoreResult<CartGuard> {
        validate_username(username)?;
        let guard = self.locks.acquire(username).await;
        Ok(CartGuard {
            username: username.to_string(),
            file: TextFile::new(self.dir.join(format!("{username}'s Cart Details.txt"))),
            _guard: guard,
        })
    }

    /// Current cart; a user who never added anything has an empty one
    pub async fn get(&self, username: &str) -> StoreResult<Cart> {
        self.lock(username).await?.load().await
    }

    /// Adds an item, or grows the quantity of a line with the same id
    pub async fn add_item(&self, username: &str, item: CartItem) -> StoreResult<Cart> {
        item.validate()?;
        let mut guard = self.lock(username).await?;
        let mut cart = guard.load().await?;

        let position = cart.items.iter().position(|existing| existing.id == item.id);
        match position {
            Some(index) => {
                let existing = &mut cart.items[index];
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => cart.items.push(item),
        }

        guard.store(&cart).await?;
        Ok(cart)
    }

    /// Shifts an item's quantity by `delta`, never below 1
    pub async fn adjust_quantity(
        &self,
        username: &str,
        item_id: &str,
        delta: i64,
    ) -> StoreResult<CartItem> {
        let mut guard = self.lock(username).await?;
        if !guard.exists().await? {
            return Err(StoreError::not_found(format!("cart of `{username}`")));
        }
        let mut cart = guard.load().await?;

        let item = cart
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| StoreError::not_found(format!("cart item `{item_id}`")))?;
        let quantity = (i64::from(item.quantity) + delta).clamp(1, i64::from(u32::MAX));
        item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let updated = item.clone();

        guard.store(&cart).await?;
        Ok(updated)
    }

    pub async fn remove_item(&self, username: &str, item_id: &str) -> StoreResult<()> {
        let mut guard = self.lock(username).await?;
        let mut cart = guard.load().await?;

        let before = cart.items.len();
        cart.items.retain(|item| item.id != item_id);
        if cart.items.len() == before {
            return Err(StoreError::not_found(format!("cart item `{item_id}`")));
        }

        guard.store(&cart).await
    }
}

/// An open, locked cart file
pub struct CartGuard {
    username: String,
    file: TextFile,
    _guard: OwnedMutexGuard<()>,
}

impl CartGuard {
    pub async fn exists(&self) -> StoreResult<bool> {
        self.file.exists().await
    }

    pub async fn load(&self) -> StoreResult<Cart> {
        let text = self.file.read().await?;
        if text.trim().is_empty() {
            return Ok(Cart::empty(self.username.clone()));
        }
        let mut cart = decode_cart(&text)?;
        if cart.username != self.username {
            tracing::warn!(
                expected = %self.username,
                found = %cart.username,
                "Cart owner line does not match its file; using the file's user"
            );
            cart.username = self.username.clone();
        }
        Ok(cart)
    }

    pub async fn store(&mut self, cart: &Cart) -> StoreResult<()> {
        self.file.replace(&encode_cart(cart)).await
    }

    /// Rewrites the cart to just its owner line
    pub async fn clear(&mut self) -> StoreResult<()> {
        self.store(&Cart::empty(self.username.clone())).await
    }
}
