//! Order line items
//!
//! A line item is a persisted {product reference, quantity} pair. Once an
//! order is created it exclusively owns its line items; they are removed
//! only by the order deletion cascade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Uuid,
    /// Product reference; the unit price is resolved through the catalog,
    /// not stored here
    pub product: Uuid,
    /// Strictly positive; validated before the item is ever persisted
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    pub fn new(product: Uuid, quantity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            product,
            quantity,
            created_at: Utc::now(),
        }
    }
}
