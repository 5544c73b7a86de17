//! Catalog products
//!
//! Products are read-only as far as the order workflow is concerned: order
//! creation consults `price` but never mutates a product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rich_description: String,
    /// Primary image URL (image storage is an external concern)
    #[serde(default)]
    pub image: String,
    /// Gallery image URLs
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub brand: String,
    /// Unit price in currency units; decimal, never floating point
    pub price: Decimal,
    /// Category reference; validated against the categories collection on
    /// create/update
    pub category: Uuid,
    #[serde(default)]
    pub count_in_stock: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: i64,
    #[serde(default)]
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}
