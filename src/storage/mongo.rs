//! MongoDB storage backend
//!
//! Collection-per-entity-type layout: `categories`, `products`, `users`,
//! `order_items` and `orders`. Entities are serialized via a
//! `serde_json::Value` intermediate and converted to BSON documents, which
//! keeps UUIDs as strings, timestamps as RFC 3339 strings and decimal
//! prices as strings — consistent and lexicographically sortable where it
//! matters (`created_at`).
//!
//! The `id` field is mapped to MongoDB's `_id` convention on the way in
//! and back out.

use anyhow::anyhow;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::{Client, Database, IndexModel};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::str::FromStr;
use uuid::Uuid;

use super::{
    CategoryStore, LineItemStore, OrderStore, ProductStore, StoreError, StoreResult, UserStore,
};
use crate::models::{Category, LineItem, Order, Product, User};

const CATEGORIES: &str = "categories";
const PRODUCTS: &str = "products";
const USERS: &str = "users";
const ORDER_ITEMS: &str = "order_items";
const ORDERS: &str = "orders";

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(anyhow!("{e}"))
}

/// Convert a `serde_json::Value` (expected to be an object) into a BSON
/// document, renaming `id` → `_id`.
fn json_to_document(json: serde_json::Value) -> StoreResult<Document> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| StoreError::Backend(anyhow!("failed to convert JSON to BSON: {e}")))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => {
            return Err(StoreError::Backend(anyhow!(
                "expected BSON document, got non-object"
            )));
        }
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON document back into a `serde_json::Value`, renaming
/// `_id` → `id`.
fn document_to_json(mut doc: Document) -> serde_json::Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn to_document<T: Serialize>(entity: &T) -> StoreResult<Document> {
    let json = serde_json::to_value(entity)
        .map_err(|e| StoreError::Backend(anyhow!("failed to serialize entity: {e}")))?;
    json_to_document(json)
}

fn from_document<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    serde_json::from_value(document_to_json(doc))
        .map_err(|e| StoreError::Backend(anyhow!("failed to deserialize entity: {e}")))
}

fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

/// MongoDB limits are `i64`; a huge `usize` must clamp, not wrap negative.
fn clamp_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

async fn collect_entities<T: DeserializeOwned>(
    cursor: mongodb::Cursor<Document>,
) -> StoreResult<Vec<T>> {
    let docs: Vec<Document> = cursor.try_collect().await.map_err(backend)?;
    docs.into_iter().map(from_document).collect()
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct MongoCategoryStore {
    database: Database,
}

impl MongoCategoryStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(CATEGORIES)
    }
}

#[async_trait]
impl CategoryStore for MongoCategoryStore {
    async fn insert(&self, category: Category) -> StoreResult<Category> {
        self.collection()
            .insert_one(to_document(&category)?)
            .await
            .map_err(backend)?;
        Ok(category)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Category>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(backend)?;
        doc.map(from_document).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Category>> {
        let cursor = self
            .collection()
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(backend)?;
        collect_entities(cursor).await
    }

    async fn update(&self, id: &Uuid, category: Category) -> StoreResult<Category> {
        let result = self
            .collection()
            .replace_one(doc! { "_id": uuid_bson(id) }, to_document(&category)?)
            .await
            .map_err(backend)?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound {
                entity: "category",
                id: *id,
            });
        }
        Ok(category)
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let result = self
            .collection()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(backend)?;
        Ok(result.deleted_count > 0)
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct MongoProductStore {
    database: Database,
}

impl MongoProductStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(PRODUCTS)
    }

    /// Create query indexes. Idempotent; safe on every startup.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let indexes = vec![
            IndexModel::builder().keys(doc! { "category": 1 }).build(),
            IndexModel::builder().keys(doc! { "is_featured": 1 }).build(),
        ];
        self.collection()
            .create_indexes(indexes)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MongoProductStore {
    async fn insert(&self, product: Product) -> StoreResult<Product> {
        self.collection()
            .insert_one(to_document(&product)?)
            .await
            .map_err(backend)?;
        Ok(product)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Product>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(backend)?;
        doc.map(from_document).transpose()
    }

    async fn list(&self, categories: Option<&[Uuid]>) -> StoreResult<Vec<Product>> {
        let filter = match categories {
            Some(cats) => {
                let ids: Vec<Bson> = cats.iter().map(uuid_bson).collect();
                doc! { "category": { "$in": ids } }
            }
            None => doc! {},
        };

        let cursor = self
            .collection()
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(backend)?;
        collect_entities(cursor).await
    }

    async fn update(&self, id: &Uuid, product: Product) -> StoreResult<Product> {
        let result = self
            .collection()
            .replace_one(doc! { "_id": uuid_bson(id) }, to_document(&product)?)
            .await
            .map_err(backend)?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound {
                entity: "product",
                id: *id,
            });
        }
        Ok(product)
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let result = self
            .collection()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(backend)?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self) -> StoreResult<u64> {
        self.collection()
            .count_documents(doc! {})
            .await
            .map_err(backend)
    }

    async fn featured(&self, limit: usize) -> StoreResult<Vec<Product>> {
        let cursor = self
            .collection()
            .find(doc! { "is_featured": true })
            .sort(doc! { "created_at": -1 })
            .limit(clamp_limit(limit))
            .await
            .map_err(backend)?;
        collect_entities(cursor).await
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct MongoUserStore {
    database: Database,
}

impl MongoUserStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(USERS)
    }

    /// Create a lookup index on `email`. Idempotent.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let indexes = vec![IndexModel::builder().keys(doc! { "email": 1 }).build()];
        self.collection()
            .create_indexes(indexes)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: User) -> StoreResult<User> {
        self.collection()
            .insert_one(to_document(&user)?)
            .await
            .map_err(backend)?;
        Ok(user)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<User>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(backend)?;
        doc.map(from_document).transpose()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let doc = self
            .collection()
            .find_one(doc! { "email": email })
            .await
            .map_err(backend)?;
        doc.map(from_document).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let cursor = self
            .collection()
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(backend)?;
        collect_entities(cursor).await
    }

    async fn update(&self, id: &Uuid, user: User) -> StoreResult<User> {
        let result = self
            .collection()
            .replace_one(doc! { "_id": uuid_bson(id) }, to_document(&user)?)
            .await
            .map_err(backend)?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound {
                entity: "user",
                id: *id,
            });
        }
        Ok(user)
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let result = self
            .collection()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(backend)?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self) -> StoreResult<u64> {
        self.collection()
            .count_documents(doc! {})
            .await
            .map_err(backend)
    }
}

// ---------------------------------------------------------------------------
// Line items
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct MongoLineItemStore {
    database: Database,
}

impl MongoLineItemStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(ORDER_ITEMS)
    }
}

#[async_trait]
impl LineItemStore for MongoLineItemStore {
    async fn insert(&self, item: LineItem) -> StoreResult<LineItem> {
        self.collection()
            .insert_one(to_document(&item)?)
            .await
            .map_err(backend)?;
        Ok(item)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<LineItem>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(backend)?;
        doc.map(from_document).transpose()
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let result = self
            .collection()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(backend)?;
        Ok(result.deleted_count > 0)
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Order store. Keeps the `Client` handle alongside the `Database` so
/// `insert_with_items` can run a multi-document session transaction.
#[derive(Clone, Debug)]
pub struct MongoOrderStore {
    client: Client,
    database: Database,
}

impl MongoOrderStore {
    pub fn new(client: Client, database: Database) -> Self {
        Self { client, database }
    }

    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(ORDERS)
    }

    fn items_collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(ORDER_ITEMS)
    }

    /// Create query indexes. Idempotent; safe on every startup.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let indexes = vec![
            IndexModel::builder().keys(doc! { "user": 1 }).build(),
            IndexModel::builder().keys(doc! { "created_at": -1 }).build(),
        ];
        self.collection()
            .create_indexes(indexes)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MongoOrderStore {
    async fn insert(&self, order: Order) -> StoreResult<Order> {
        self.collection()
            .insert_one(to_document(&order)?)
            .await
            .map_err(backend)?;
        Ok(order)
    }

    /// Multi-document transaction: all line items plus the order commit
    /// together or not at all. Requires a replica set (or sharded cluster),
    /// which is also MongoDB's own prerequisite for transactions.
    async fn insert_with_items(&self, order: Order, items: Vec<LineItem>) -> StoreResult<Order> {
        let order_doc = to_document(&order)?;
        let item_docs: Vec<Document> = items
            .iter()
            .map(to_document)
            .collect::<StoreResult<Vec<_>>>()?;

        let mut session = self.client.start_session().await.map_err(backend)?;
        session.start_transaction().await.map_err(backend)?;

        let result: Result<(), mongodb::error::Error> = async {
            for doc in item_docs {
                self.items_collection()
                    .insert_one(doc)
                    .session(&mut session)
                    .await?;
            }
            self.collection()
                .insert_one(order_doc)
                .session(&mut session)
                .await?;
            session.commit_transaction().await
        }
        .await;

        if let Err(e) = result {
            // Abort is best effort; an unresolved transaction times out
            // server-side anyway.
            let _ = session.abort_transaction().await;
            return Err(backend(e));
        }

        Ok(order)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<Order>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(backend)?;
        doc.map(from_document).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Order>> {
        let cursor = self
            .collection()
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(backend)?;
        collect_entities(cursor).await
    }

    async fn list_by_user(&self, user: &Uuid) -> StoreResult<Vec<Order>> {
        let cursor = self
            .collection()
            .find(doc! { "user": uuid_bson(user) })
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(backend)?;
        collect_entities(cursor).await
    }

    async fn update_status(&self, id: &Uuid, status: &str) -> StoreResult<Order> {
        let result = self
            .collection()
            .update_one(
                doc! { "_id": uuid_bson(id) },
                doc! { "$set": { "status": status } },
            )
            .await
            .map_err(backend)?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound {
                entity: "order",
                id: *id,
            });
        }

        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound {
                entity: "order",
                id: *id,
            })?;
        from_document(doc)
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let result = self
            .collection()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(backend)?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self) -> StoreResult<u64> {
        self.collection()
            .count_documents(doc! {})
            .await
            .map_err(backend)
    }

    /// Prices are stored as decimal strings, so summation happens here
    /// rather than in an aggregation pipeline. Only `total_price` is
    /// projected to keep the cursor light.
    async fn total_sales(&self) -> StoreResult<Decimal> {
        let cursor = self
            .collection()
            .find(doc! {})
            .projection(doc! { "total_price": 1 })
            .await
            .map_err(backend)?;

        let docs: Vec<Document> = cursor.try_collect().await.map_err(backend)?;

        let mut total = Decimal::ZERO;
        for doc in docs {
            let raw = doc.get_str("total_price").map_err(backend)?;
            let price = Decimal::from_str(raw)
                .map_err(|e| StoreError::Backend(anyhow!("invalid stored total_price: {e}")))?;
            total += price;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShippingDetails;
    use serde_json::json;

    #[test]
    fn limits_clamp_instead_of_wrapping() {
        assert_eq!(clamp_limit(4), 4);
        assert_eq!(clamp_limit(usize::MAX), i64::MAX);
    }

    #[test]
    fn json_to_document_renames_id() {
        let doc = json_to_document(json!({"id": "abc", "name": "widget"})).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), "abc");
        assert!(!doc.contains_key("id"));
    }

    #[test]
    fn json_to_document_rejects_non_objects() {
        assert!(json_to_document(json!("scalar")).is_err());
    }

    #[test]
    fn document_to_json_restores_id() {
        let json = document_to_json(doc! { "_id": "abc", "name": "widget" });
        assert_eq!(json["id"], "abc");
        assert!(json.get("_id").is_none());
    }

    #[test]
    fn order_round_trips_through_document() {
        let order = Order::new(
            vec![Uuid::new_v4(), Uuid::new_v4()],
            ShippingDetails {
                shipping_address1: "1 Main St".to_string(),
                shipping_address2: None,
                city: "Springfield".to_string(),
                zip: "12345".to_string(),
                state: "IL".to_string(),
                country: "US".to_string(),
                phone: "555-0100".to_string(),
            },
            None,
            Decimal::new(2997, 2),
            Uuid::new_v4(),
        );

        let doc = to_document(&order).unwrap();
        // Decimal prices are stored as strings
        assert_eq!(doc.get_str("total_price").unwrap(), "29.97");

        let back: Order = from_document(doc).unwrap();
        assert_eq!(back.id, order.id);
        assert_eq!(back.order_items, order.order_items);
        assert_eq!(back.total_price, order.total_price);
        assert_eq!(back.shipping.city, "Springfield");
    }

    #[test]
    fn line_item_quantity_survives_round_trip() {
        let item = LineItem::new(Uuid::new_v4(), 3);
        let back: LineItem = from_document(to_document(&item).unwrap()).unwrap();
        assert_eq!(back.quantity, 3);
        assert_eq!(back.product, item.product);
    }
}
