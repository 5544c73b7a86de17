//! Storage backends
//!
//! Each entity type has a store trait; MongoDB implements them for
//! production ([`mongo`]) and an in-memory backend implements them for
//! tests and development ([`memory`]). The rest of the service only ever
//! sees `Arc<dyn ...Store>`.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Category, LineItem, Order, Product, User};

pub use memory::{
    InMemoryCategoryStore, InMemoryLineItemStore, InMemoryOrderStore, InMemoryProductStore,
    InMemoryUserStore,
};
pub use mongo::{
    MongoCategoryStore, MongoLineItemStore, MongoOrderStore, MongoProductStore, MongoUserStore,
};

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An update/read targeted a document that does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// The backend itself failed (connection, serialization, transaction).
    #[error("storage backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn insert(&self, category: Category) -> StoreResult<Category>;
    async fn get(&self, id: &Uuid) -> StoreResult<Option<Category>>;
    async fn list(&self) -> StoreResult<Vec<Category>>;
    async fn update(&self, id: &Uuid, category: Category) -> StoreResult<Category>;
    /// Returns whether a document was actually removed.
    async fn delete(&self, id: &Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: Product) -> StoreResult<Product>;
    async fn get(&self, id: &Uuid) -> StoreResult<Option<Product>>;
    /// List products, optionally restricted to a set of categories.
    async fn list(&self, categories: Option<&[Uuid]>) -> StoreResult<Vec<Product>>;
    async fn update(&self, id: &Uuid, product: Product) -> StoreResult<Product>;
    async fn delete(&self, id: &Uuid) -> StoreResult<bool>;
    async fn count(&self) -> StoreResult<u64>;
    /// Up to `limit` featured products.
    async fn featured(&self, limit: usize) -> StoreResult<Vec<Product>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> StoreResult<User>;
    async fn get(&self, id: &Uuid) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list(&self) -> StoreResult<Vec<User>>;
    async fn update(&self, id: &Uuid, user: User) -> StoreResult<User>;
    async fn delete(&self, id: &Uuid) -> StoreResult<bool>;
    async fn count(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait LineItemStore: Send + Sync {
    async fn insert(&self, item: LineItem) -> StoreResult<LineItem>;
    async fn get(&self, id: &Uuid) -> StoreResult<Option<LineItem>>;
    /// Returns whether a document was actually removed; deleting a missing
    /// id is reported, not fatal.
    async fn delete(&self, id: &Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: Order) -> StoreResult<Order>;

    /// Write the order and its line items as one atomic unit: either all
    /// documents land or none do.
    async fn insert_with_items(&self, order: Order, items: Vec<LineItem>) -> StoreResult<Order>;

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Order>>;

    /// All orders, newest first.
    async fn list(&self) -> StoreResult<Vec<Order>>;

    /// A user's orders, newest first.
    async fn list_by_user(&self, user: &Uuid) -> StoreResult<Vec<Order>>;

    /// Update only the status tag; the rest of an order is immutable.
    async fn update_status(&self, id: &Uuid, status: &str) -> StoreResult<Order>;

    async fn delete(&self, id: &Uuid) -> StoreResult<bool>;

    async fn count(&self) -> StoreResult<u64>;

    /// Sum of `total_price` across all stored orders.
    async fn total_sales(&self) -> StoreResult<Decimal>;
}
