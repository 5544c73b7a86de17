//! Orders
//!
//! An order references its line items by id, in submission order, and
//! stores the total price computed at creation time. The total is a
//! point-in-time snapshot: `total_price == Σ quantity × unit price` over
//! the referenced items, evaluated once and immutable thereafter.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status assigned to newly created orders.
pub const DEFAULT_ORDER_STATUS: &str = "pending";

/// Shipping fields captured with an order. Opaque strings; the backend
/// does not validate postal data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub shipping_address1: String,
    #[serde(default)]
    pub shipping_address2: Option<String>,
    pub city: String,
    pub zip: String,
    #[serde(default)]
    pub state: String,
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Line item ids, in the order they were submitted
    pub order_items: Vec<Uuid>,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    /// Free-form status tag (`pending`, `shipped`, ...)
    pub status: String,
    /// Derived: sum of line-item subtotals at creation time
    pub total_price: Decimal,
    /// The user who placed the order
    pub user: Uuid,
    /// Creation timestamp; listings sort on this, descending
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        order_items: Vec<Uuid>,
        shipping: ShippingDetails,
        status: Option<String>,
        total_price: Decimal,
        user: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_items,
            shipping,
            status: status.unwrap_or_else(|| DEFAULT_ORDER_STATUS.to_string()),
            total_price,
            user,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_order_defaults_to_pending() {
        let order = Order::new(
            vec![Uuid::new_v4()],
            ShippingDetails::default(),
            None,
            Decimal::new(2997, 2),
            Uuid::new_v4(),
        );
        assert_eq!(order.status, DEFAULT_ORDER_STATUS);
    }

    #[test]
    fn explicit_status_is_preserved() {
        let order = Order::new(
            vec![],
            ShippingDetails::default(),
            Some("shipped".to_string()),
            Decimal::ZERO,
            Uuid::new_v4(),
        );
        assert_eq!(order.status, "shipped");
    }
}
