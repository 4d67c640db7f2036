//! Repositories over the flat-text tables
//!
//! Each repository is the only code that touches its backing file. Every
//! mutating call is a full load → modify → atomic replace cycle performed
//! while holding that file's lock. Missing keys fail with
//! [`StoreError::NotFound`](crate::error::StoreError::NotFound), duplicate
//! keys on create with [`StoreError::Conflict`](crate::error::StoreError::Conflict).

pub mod carts;
pub mod orders;
pub mod products;
pub mod ratings;
pub mod users;

pub use carts::{CartGuard, Carts};
pub use orders::{next_order_id, Orders};
pub use products::Products;
pub use ratings::{average_ratings, Ratings};
pub use users::Users;
