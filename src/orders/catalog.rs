//! Read-only catalog lookup
//!
//! The order workflow never touches products directly; it resolves prices
//! and existence through this thin facade over the product store.

use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::CatalogError;
use crate::storage::ProductStore;

#[derive(Clone)]
pub struct Catalog {
    products: Arc<dyn ProductStore>,
}

impl Catalog {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    /// Unit price of a product, or [`CatalogError::NotFound`] on a miss.
    pub async fn price_of(&self, product: &Uuid) -> Result<Decimal, CatalogError> {
        let found = self.products.get(product).await?;
        match found {
            Some(p) => Ok(p.price),
            None => Err(CatalogError::NotFound { id: *product }),
        }
    }

    /// Whether a product reference resolves.
    pub async fn exists(&self, product: &Uuid) -> Result<bool, CatalogError> {
        Ok(self.products.get(product).await?.is_some())
    }
}
