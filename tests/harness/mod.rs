//! Shared test harness
//!
//! Builders for in-memory stores, a wired-up order workflow, and a full
//! HTTP test server seeded with an admin and a regular user.
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod harness;
//! use harness::*;
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use eshop::config::AppConfig;
use eshop::core::auth::hash_password;
use eshop::models::{Address, Category, LineItem, Order, Product, ShippingDetails, User};
use eshop::orders::{NewOrder, NewOrderItem, OrderWorkflow, WorkflowOptions};
use eshop::storage::{
    CategoryStore, InMemoryCategoryStore, InMemoryLineItemStore, InMemoryOrderStore,
    InMemoryProductStore, InMemoryUserStore, OrderStore, ProductStore, StoreError, StoreResult,
    UserStore,
};
use eshop::web::{self, AppState};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const USER_EMAIL: &str = "shopper@example.com";
pub const USER_PASSWORD: &str = "shopper-password";

// ---------------------------------------------------------------------------
// Store bundle and workflow builders
// ---------------------------------------------------------------------------

/// The full set of in-memory stores, kept as concrete types so tests can
/// inspect state directly (e.g. [`InMemoryLineItemStore::len`]).
#[derive(Clone)]
pub struct TestStores {
    pub categories: InMemoryCategoryStore,
    pub products: InMemoryProductStore,
    pub users: InMemoryUserStore,
    pub items: InMemoryLineItemStore,
    pub orders: InMemoryOrderStore,
}

impl TestStores {
    pub fn new() -> Self {
        let items = InMemoryLineItemStore::new();
        Self {
            categories: InMemoryCategoryStore::new(),
            products: InMemoryProductStore::new(),
            users: InMemoryUserStore::new(),
            orders: InMemoryOrderStore::new(items.clone()),
            items,
        }
    }

    /// Build a workflow over these stores.
    pub fn workflow(&self, options: WorkflowOptions) -> OrderWorkflow {
        OrderWorkflow::new(
            Arc::new(self.orders.clone()),
            Arc::new(self.items.clone()),
            Arc::new(self.products.clone()),
            options,
        )
    }

    /// Build a workflow whose order store is wrapped so that every write
    /// fails. Reads still pass through.
    pub fn workflow_with_broken_order_writes(&self, options: WorkflowOptions) -> OrderWorkflow {
        OrderWorkflow::new(
            Arc::new(FailingOrderStore {
                inner: self.orders.clone(),
            }),
            Arc::new(self.items.clone()),
            Arc::new(self.products.clone()),
            options,
        )
    }
}

/// Wraps an order store, rejecting every write with a backend error.
pub struct FailingOrderStore {
    pub inner: InMemoryOrderStore,
}

fn write_refused() -> StoreError {
    StoreError::Backend(anyhow::anyhow!("order writes refused by test store"))
}

#[async_trait]
impl OrderStore for FailingOrderStore {
    async fn insert(&self, _order: Order) -> StoreResult<Order> {
        Err(write_refused())
    }

    async fn insert_with_items(&self, _order: Order, _items: Vec<LineItem>) -> StoreResult<Order> {
        Err(write_refused())
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Order>> {
        self.inner.get(id).await
    }

    async fn list(&self) -> StoreResult<Vec<Order>> {
        self.inner.list().await
    }

    async fn list_by_user(&self, user: &Uuid) -> StoreResult<Vec<Order>> {
        self.inner.list_by_user(user).await
    }

    async fn update_status(&self, _id: &Uuid, _status: &str) -> StoreResult<Order> {
        Err(write_refused())
    }

    async fn delete(&self, _id: &Uuid) -> StoreResult<bool> {
        Err(write_refused())
    }

    async fn count(&self) -> StoreResult<u64> {
        self.inner.count().await
    }

    async fn total_sales(&self) -> StoreResult<Decimal> {
        self.inner.total_sales().await
    }
}

// ---------------------------------------------------------------------------
// Entity builders
// ---------------------------------------------------------------------------

pub fn category(name: &str) -> Category {
    Category::new(name.to_string(), None, None)
}

pub fn product(name: &str, price: Decimal, category: Uuid) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: String::new(),
        rich_description: String::new(),
        image: String::new(),
        images: vec![],
        brand: String::new(),
        price,
        category,
        count_in_stock: 10,
        rating: 0.0,
        num_reviews: 0,
        is_featured: false,
        created_at: Utc::now(),
    }
}

pub fn shipping() -> ShippingDetails {
    ShippingDetails {
        shipping_address1: "1 Main St".to_string(),
        shipping_address2: None,
        city: "Springfield".to_string(),
        zip: "12345".to_string(),
        state: "IL".to_string(),
        country: "US".to_string(),
        phone: "555-0100".to_string(),
    }
}

pub fn new_order(user: Uuid, items: &[(Uuid, i64)]) -> NewOrder {
    NewOrder {
        items: items
            .iter()
            .map(|(product, quantity)| NewOrderItem {
                product: *product,
                quantity: *quantity,
            })
            .collect(),
        shipping: shipping(),
        status: None,
        user,
    }
}

// ---------------------------------------------------------------------------
// HTTP test server
// ---------------------------------------------------------------------------

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|var| match var {
        "ESHOP_JWT_SECRET" => Some("integration-test-secret".to_string()),
        _ => None,
    })
    .expect("test config should load")
}

/// A running test server plus handles into its state and seeded accounts.
pub struct TestApp {
    pub server: TestServer,
    pub stores: TestStores,
    pub admin: User,
    pub user: User,
}

impl TestApp {
    /// Spin up the full router over in-memory stores, with one admin and
    /// one regular user already registered.
    pub async fn spawn() -> Self {
        let stores = TestStores::new();
        let config = test_config();

        let admin = User::new(
            "Admin".to_string(),
            ADMIN_EMAIL.to_string(),
            hash_password(ADMIN_PASSWORD).unwrap(),
            String::new(),
            true,
            Address::default(),
        );
        let user = User::new(
            "Shopper".to_string(),
            USER_EMAIL.to_string(),
            hash_password(USER_PASSWORD).unwrap(),
            String::new(),
            false,
            Address::default(),
        );
        stores.users.insert(admin.clone()).await.unwrap();
        stores.users.insert(user.clone()).await.unwrap();

        let state = AppState::new(
            Arc::new(stores.categories.clone()),
            Arc::new(stores.products.clone()),
            Arc::new(stores.users.clone()),
            Arc::new(stores.items.clone()),
            Arc::new(stores.orders.clone()),
            &config,
        );

        let server = TestServer::new(web::router(state, &config.api_prefix));
        Self {
            server,
            stores,
            admin,
            user,
        }
    }

    /// Log in through the API and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .server
            .post("/api/v1/users/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .await;
        response.assert_status_ok();
        response.json::<serde_json::Value>()["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn user_token(&self) -> String {
        self.login(USER_EMAIL, USER_PASSWORD).await
    }

    /// Seed a category and a product through the stores directly.
    pub async fn seed_product(&self, name: &str, price: Decimal) -> Product {
        let cat = self.stores.categories.insert(category("seeded")).await.unwrap();
        self.stores
            .products
            .insert(product(name, price, cat.id))
            .await
            .unwrap()
    }
}
