use std::collections::HashMap;
use std::path::PathBuf;

use rust_decimal::Decimal;

use crate::error::{StoreError, StoreResult};
use crate::model::{round_currency, Rating};
use crate::storage::TableFile;

/// The ratings log (`ratings.txt`), keyed by `(username, productId)`
pub struct Ratings {
    table: TableFile<Rating>,
}

impl Ratings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            table: TableFile::new(path),
        }
    }

    pub async fn load_all(&self) -> StoreResult<Vec<Rating>> {
        self.table.load_all().await
    }

    /// Creates the rating or overwrites the user's previous score
    ///
    /// Returns `true` when a new record was created.
    pub async fn upsert(&self, rating: Rating) -> StoreResult<bool> {
        if !(1..=5).contains(&rating.rating) {
            return Err(StoreError::validation("rating must be between 1 and 5"));
        }

        let mut table = self.table.lock().await;
        let mut ratings = table.load().await?;

        let position = ratings.iter().position(|existing| {
            existing.username == rating.username && existing.product_id == rating.product_id
        });
        let created = match position {
            Some(index) => {
                ratings[index] = rating;
                false
            }
            None => {
                ratings.push(rating);
                true
            }
        };

        table.store(&ratings).await?;
        Ok(created)
    }
}

/// Mean score per product id, rounded to 2 decimals
pub fn average_ratings(ratings: &[Rating]) -> HashMap<String, Decimal> {
    let mut totals: HashMap<&str, (i64, i64)> = HashMap::new();
    for rating in ratings {
        let entry = totals.entry(rating.product_id.as_str()).or_default();
        entry.0 = entry.0.saturating_add(rating.rating);
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(product_id, (sum, count))| {
            (
                product_id.to_string(),
                round_currency(Decimal::from(sum) / Decimal::from(count)),
            )
        })
        .collect()
}
