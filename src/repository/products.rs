use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};
use crate::model::{flatten_free_text, validate_field, Product, ProductUpdate};
use crate::storage::{TableFile, TableGuard};

/// The product catalogue (`products.txt`), kept sorted by id
pub struct Products {
    table: TableFile<Product>,
}

impl Products {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            table: TableFile::new(path),
        }
    }

    /// Exclusive access for multi-table updates (stock decrement)
    pub async fn lock(&self) -> TableGuard<'_, Product> {
        self.table.lock().await
    }

    pub async fn load_all(&self) -> StoreResult<Vec<Product>> {
        self.table.load_all().await
    }

    pub async fn find(&self, id: &str) -> StoreResult<Product> {
        self.load_all()
            .await?
            .into_iter()
            .find(|product| product.id == id)
            .ok_or_else(|| StoreError::not_found(format!("product `{id}`")))
    }

    /// Adds a product and re-sorts the catalogue by id
    pub async fn insert(&self, mut product: Product) -> StoreResult<Product> {
        product.validate()?;
        product.description = flatten_free_text(&product.description);

        let mut table = self.table.lock().await;
        let mut products = table.load().await?;

        if products.iter().any(|existing| existing.id == product.id) {
            return Err(StoreError::Conflict("Product ID already exists.".to_string()));
        }
        products.push(product.clone());
        products.sort_by(|a, b| a.id.cmp(&b.id));

        table.store(&products).await?;
        tracing::info!(product_id = %product.id, "Product added");
        Ok(product)
    }

    /// Overwrites the given fields of an existing product
    pub async fn update(&self, update: ProductUpdate) -> StoreResult<Product> {
        if let Some(name) = &update.name {
            validate_field("name", name)?;
        }

        let mut table = self.table.lock().await;
        let mut products = table.load().await?;

        let product = products
            .iter_mut()
            .find(|product| product.id == update.id)
            .ok_or_else(|| StoreError::not_found(format!("product `{}`", update.id)))?;

        let mut edited = product.clone();
        if let Some(name) = update.name {
            edited.name = name;
        }
        if let Some(price) = update.price {
            edited.price = price;
        }
        if let Some(quantity) = update.quantity {
            edited.quantity = quantity;
        }
        if let Some(description) = update.description {
            edited.description = flatten_free_text(&description);
        }
        edited.validate()?;
        *product = edited.clone();

        table.store(&products).await?;
        Ok(edited)
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut table = self.table.lock().await;
        let mut products = table.load().await?;

        let before = products.len();
        products.retain(|product| product.id != id);
        if products.len() == before {
            return Err(StoreError::not_found(format!("product `{id}`")));
        }

        table.store(&products).await
    }
}
