//! In-memory store implementations for testing and development
//!
//! Thread-safe via `RwLock`; clones share the same underlying maps, so a
//! cloned store is a handle, not a copy.

use anyhow::anyhow;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::{
    CategoryStore, LineItemStore, OrderStore, ProductStore, StoreError, StoreResult, UserStore,
};
use crate::models::{Category, LineItem, Order, Product, User};

type Shared<T> = Arc<RwLock<HashMap<Uuid, T>>>;

fn poisoned(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(anyhow!("lock poisoned: {e}"))
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct InMemoryCategoryStore {
    categories: Shared<Category>,
}

impl InMemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn insert(&self, category: Category) -> StoreResult<Category> {
        let mut map = self.categories.write().map_err(poisoned)?;
        map.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Category>> {
        let map = self.categories.read().map_err(poisoned)?;
        Ok(map.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Category>> {
        let map = self.categories.read().map_err(poisoned)?;
        let mut all: Vec<Category> = map.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update(&self, id: &Uuid, category: Category) -> StoreResult<Category> {
        let mut map = self.categories.write().map_err(poisoned)?;
        if !map.contains_key(id) {
            return Err(StoreError::NotFound {
                entity: "category",
                id: *id,
            });
        }
        map.insert(*id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let mut map = self.categories.write().map_err(poisoned)?;
        Ok(map.remove(id).is_some())
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    products: Shared<Product>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: Product) -> StoreResult<Product> {
        let mut map = self.products.write().map_err(poisoned)?;
        map.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Product>> {
        let map = self.products.read().map_err(poisoned)?;
        Ok(map.get(id).cloned())
    }

    async fn list(&self, categories: Option<&[Uuid]>) -> StoreResult<Vec<Product>> {
        let map = self.products.read().map_err(poisoned)?;
        let mut all: Vec<Product> = map
            .values()
            .filter(|p| categories.is_none_or(|cats| cats.contains(&p.category)))
            .cloned()
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update(&self, id: &Uuid, product: Product) -> StoreResult<Product> {
        let mut map = self.products.write().map_err(poisoned)?;
        if !map.contains_key(id) {
            return Err(StoreError::NotFound {
                entity: "product",
                id: *id,
            });
        }
        map.insert(*id, product.clone());
        Ok(product)
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let mut map = self.products.write().map_err(poisoned)?;
        Ok(map.remove(id).is_some())
    }

    async fn count(&self) -> StoreResult<u64> {
        let map = self.products.read().map_err(poisoned)?;
        Ok(map.len() as u64)
    }

    async fn featured(&self, limit: usize) -> StoreResult<Vec<Product>> {
        let map = self.products.read().map_err(poisoned)?;
        let mut featured: Vec<Product> = map.values().filter(|p| p.is_featured).cloned().collect();
        featured.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        featured.truncate(limit);
        Ok(featured)
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Shared<User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> StoreResult<User> {
        let mut map = self.users.write().map_err(poisoned)?;
        map.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<User>> {
        let map = self.users.read().map_err(poisoned)?;
        Ok(map.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let map = self.users.read().map_err(poisoned)?;
        Ok(map.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let map = self.users.read().map_err(poisoned)?;
        let mut all: Vec<User> = map.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update(&self, id: &Uuid, user: User) -> StoreResult<User> {
        let mut map = self.users.write().map_err(poisoned)?;
        if !map.contains_key(id) {
            return Err(StoreError::NotFound {
                entity: "user",
                id: *id,
            });
        }
        map.insert(*id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let mut map = self.users.write().map_err(poisoned)?;
        Ok(map.remove(id).is_some())
    }

    async fn count(&self) -> StoreResult<u64> {
        let map = self.users.read().map_err(poisoned)?;
        Ok(map.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// Line items
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct InMemoryLineItemStore {
    items: Shared<LineItem>,
}

impl InMemoryLineItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored line items; handy in tests for "persists nothing"
    /// assertions.
    pub fn len(&self) -> usize {
        self.items.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LineItemStore for InMemoryLineItemStore {
    async fn insert(&self, item: LineItem) -> StoreResult<LineItem> {
        let mut map = self.items.write().map_err(poisoned)?;
        map.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<LineItem>> {
        let map = self.items.read().map_err(poisoned)?;
        Ok(map.get(id).cloned())
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let mut map = self.items.write().map_err(poisoned)?;
        Ok(map.remove(id).is_some())
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// In-memory order store. Holds a handle to the line item store so
/// `insert_with_items` can take both maps under one critical section.
#[derive(Clone)]
pub struct InMemoryOrderStore {
    orders: Shared<Order>,
    items: InMemoryLineItemStore,
}

impl InMemoryOrderStore {
    pub fn new(items: InMemoryLineItemStore) -> Self {
        Self {
            orders: Arc::default(),
            items,
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> StoreResult<Order> {
        let mut map = self.orders.write().map_err(poisoned)?;
        map.insert(order.id, order.clone());
        Ok(order)
    }

    async fn insert_with_items(&self, order: Order, items: Vec<LineItem>) -> StoreResult<Order> {
        // Both locks held for the duration of the write; readers observe
        // either none of the documents or all of them.
        let mut item_map = self.items.items.write().map_err(poisoned)?;
        let mut order_map = self.orders.write().map_err(poisoned)?;

        for item in items {
            item_map.insert(item.id, item);
        }
        order_map.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Order>> {
        let map = self.orders.read().map_err(poisoned)?;
        Ok(map.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Order>> {
        let map = self.orders.read().map_err(poisoned)?;
        let mut all: Vec<Order> = map.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_by_user(&self, user: &Uuid) -> StoreResult<Vec<Order>> {
        let map = self.orders.read().map_err(poisoned)?;
        let mut mine: Vec<Order> = map.values().filter(|o| &o.user == user).cloned().collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    async fn update_status(&self, id: &Uuid, status: &str) -> StoreResult<Order> {
        let mut map = self.orders.write().map_err(poisoned)?;
        let order = map.get_mut(id).ok_or(StoreError::NotFound {
            entity: "order",
            id: *id,
        })?;
        order.status = status.to_string();
        Ok(order.clone())
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let mut map = self.orders.write().map_err(poisoned)?;
        Ok(map.remove(id).is_some())
    }

    async fn count(&self) -> StoreResult<u64> {
        let map = self.orders.read().map_err(poisoned)?;
        Ok(map.len() as u64)
    }

    async fn total_sales(&self) -> StoreResult<Decimal> {
        let map = self.orders.read().map_err(poisoned)?;
        Ok(map.values().map(|o| o.total_price).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShippingDetails;
    use chrono::{Duration, Utc};

    fn order_at(offset_secs: i64, user: Uuid) -> Order {
        let mut order = Order::new(
            vec![],
            ShippingDetails::default(),
            None,
            Decimal::new(1000, 2),
            user,
        );
        order.created_at = Utc::now() + Duration::seconds(offset_secs);
        order
    }

    #[tokio::test]
    async fn orders_list_newest_first() {
        let store = InMemoryOrderStore::new(InMemoryLineItemStore::new());
        let user = Uuid::new_v4();

        let first = order_at(-30, user);
        let second = order_at(-20, user);
        let third = order_at(-10, user);
        store.insert(first.clone()).await.unwrap();
        store.insert(third.clone()).await.unwrap();
        store.insert(second.clone()).await.unwrap();

        let listed = store.list().await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn list_by_user_filters_and_sorts() {
        let store = InMemoryOrderStore::new(InMemoryLineItemStore::new());
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let a1 = order_at(-30, alice);
        let b1 = order_at(-20, bob);
        let a2 = order_at(-10, alice);
        for o in [&a1, &b1, &a2] {
            store.insert(o.clone()).await.unwrap();
        }

        let mine = store.list_by_user(&alice).await.unwrap();
        let ids: Vec<Uuid> = mine.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![a2.id, a1.id]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryLineItemStore::new();
        let item = LineItem::new(Uuid::new_v4(), 1);
        store.insert(item.clone()).await.unwrap();

        assert!(store.delete(&item.id).await.unwrap());
        assert!(!store.delete(&item.id).await.unwrap());
    }

    #[tokio::test]
    async fn insert_with_items_writes_both_collections() {
        let items = InMemoryLineItemStore::new();
        let store = InMemoryOrderStore::new(items.clone());

        let li = LineItem::new(Uuid::new_v4(), 2);
        let order = Order::new(
            vec![li.id],
            ShippingDetails::default(),
            None,
            Decimal::new(500, 2),
            Uuid::new_v4(),
        );

        store
            .insert_with_items(order.clone(), vec![li.clone()])
            .await
            .unwrap();

        assert!(store.get(&order.id).await.unwrap().is_some());
        assert!(items.get(&li.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn total_sales_sums_stored_totals() {
        let store = InMemoryOrderStore::new(InMemoryLineItemStore::new());
        let user = Uuid::new_v4();

        let mut o1 = order_at(-2, user);
        o1.total_price = Decimal::new(2997, 2); // 29.97
        let mut o2 = order_at(-1, user);
        o2.total_price = Decimal::new(2550, 2); // 25.50
        store.insert(o1).await.unwrap();
        store.insert(o2).await.unwrap();

        assert_eq!(store.total_sales().await.unwrap(), Decimal::new(5547, 2));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_status_on_missing_order_reports_not_found() {
        let store = InMemoryOrderStore::new(InMemoryLineItemStore::new());
        let result = store.update_status(&Uuid::new_v4(), "shipped").await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn product_list_filters_by_category() {
        let store = InMemoryProductStore::new();
        let cat_a = Uuid::new_v4();
        let cat_b = Uuid::new_v4();

        let mk = |cat: Uuid| Product {
            id: Uuid::new_v4(),
            name: "p".to_string(),
            description: String::new(),
            rich_description: String::new(),
            image: String::new(),
            images: vec![],
            brand: String::new(),
            price: Decimal::ONE,
            category: cat,
            count_in_stock: 1,
            rating: 0.0,
            num_reviews: 0,
            is_featured: false,
            created_at: Utc::now(),
        };

        store.insert(mk(cat_a)).await.unwrap();
        store.insert(mk(cat_a)).await.unwrap();
        store.insert(mk(cat_b)).await.unwrap();

        assert_eq!(store.list(None).await.unwrap().len(), 3);
        assert_eq!(store.list(Some(&[cat_a])).await.unwrap().len(), 2);
        assert_eq!(store.list(Some(&[cat_b])).await.unwrap().len(), 1);
    }
}
