//! The order-creation workflow
//!
//! Creation walks a fixed sequence of states:
//!
//! ```text
//! Received → ItemsPersisted → Aggregated → Persisted
//! ```
//!
//! with `Failed` as the terminal failure state at any step. `Received`
//! validates the request (non-empty item list, positive quantities,
//! resolvable product references when strict checking is on). What happens
//! next depends on the configured [`WriteMode`]:
//!
//! - [`WriteMode::Atomic`] (default): line items and the order are written
//!   in one storage transaction; a failure leaves nothing behind.
//! - [`WriteMode::Sequential`]: items are persisted one by one, re-read
//!   during aggregation and finally the order is written. Any failure
//!   after the first item triggers compensation — every created item is
//!   deleted before the error is surfaced, so no orphans are left.
//!
//! In both modes the stored total equals the exact sum of line-item
//! subtotals at creation time.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::catalog::Catalog;
use super::pricing;
use crate::core::error::{ApiError, CatalogError, OrderError};
use crate::models::{LineItem, Order, ShippingDetails};
use crate::storage::{LineItemStore, OrderStore, ProductStore};

/// How order creation writes to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Single storage-level transaction (all-or-nothing).
    Atomic,
    /// Step-by-step writes with compensation on failure.
    Sequential,
}

/// Workflow configuration, taken from [`crate::config::AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct WorkflowOptions {
    /// Reject unresolvable product references before persisting anything.
    /// With this off, a bad reference still fails the order — but only
    /// when aggregation cannot resolve the price.
    pub strict_product_refs: bool,
    pub write_mode: WriteMode,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            strict_product_refs: true,
            write_mode: WriteMode::Atomic,
        }
    }
}

/// A requested line item, as submitted by the caller. Unvalidated.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product: Uuid,
    pub quantity: i64,
}

/// A requested order. The user reference comes from the resolved bearer
/// credential, not the request body.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    pub shipping: ShippingDetails,
    pub status: Option<String>,
    pub user: Uuid,
}

/// Orchestrates order creation, the deletion cascade, listings and the
/// read-side aggregates.
#[derive(Clone)]
pub struct OrderWorkflow {
    orders: Arc<dyn OrderStore>,
    items: Arc<dyn LineItemStore>,
    catalog: Catalog,
    options: WorkflowOptions,
}

impl OrderWorkflow {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        items: Arc<dyn LineItemStore>,
        products: Arc<dyn ProductStore>,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            orders,
            items,
            catalog: Catalog::new(products),
            options,
        }
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create an order from a request.
    ///
    /// On success the persisted order is returned, its `total_price` equal
    /// to the sum of line-item subtotals. On failure nothing remains in
    /// storage (atomic mode) or everything created is compensated for
    /// (sequential mode).
    pub async fn create(&self, request: NewOrder) -> Result<Order, ApiError> {
        // Received: validate before any storage call.
        if request.items.is_empty() {
            return Err(OrderError::Empty.into());
        }

        let mut validated: Vec<(Uuid, u32)> = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let quantity = pricing::validate_quantity(item.product, item.quantity)?;
            validated.push((item.product, quantity));
        }

        if self.options.strict_product_refs {
            for (product, _) in &validated {
                if !self.catalog.exists(product).await.map_err(ApiError::from)? {
                    return Err(OrderError::InvalidReference { product: *product }.into());
                }
            }
        }

        let order = match self.options.write_mode {
            WriteMode::Atomic => self.create_atomic(&request, &validated).await?,
            WriteMode::Sequential => self.create_sequential(&request, &validated).await?,
        };

        info!(
            order = %order.id,
            items = order.order_items.len(),
            total = %order.total_price,
            "order created"
        );
        Ok(order)
    }

    /// Aggregate prices first, then hand every document to the store as a
    /// single transactional write.
    async fn create_atomic(
        &self,
        request: &NewOrder,
        validated: &[(Uuid, u32)],
    ) -> Result<Order, ApiError> {
        let mut line_items = Vec::with_capacity(validated.len());
        let mut subtotals = Vec::with_capacity(validated.len());

        for (product, quantity) in validated {
            let unit_price = self.resolve_price(product).await?;
            let subtotal =
                pricing::subtotal(unit_price, *quantity).ok_or(OrderError::TotalOverflow)?;
            subtotals.push(subtotal);
            line_items.push(LineItem::new(*product, *quantity));
        }

        let total = pricing::total(subtotals).ok_or(OrderError::TotalOverflow)?;
        let item_ids: Vec<Uuid> = line_items.iter().map(|li| li.id).collect();
        let order = Order::new(
            item_ids,
            request.shipping.clone(),
            request.status.clone(),
            total,
            request.user,
        );

        self.orders
            .insert_with_items(order, line_items)
            .await
            .map_err(|source| OrderError::PersistenceFailed { source }.into())
    }

    /// The legacy step order: persist items, re-read them for aggregation,
    /// persist the order. Compensates created items on any failure.
    async fn create_sequential(
        &self,
        request: &NewOrder,
        validated: &[(Uuid, u32)],
    ) -> Result<Order, ApiError> {
        // ItemsPersisted: ids collected in submission order.
        let mut created: Vec<Uuid> = Vec::with_capacity(validated.len());
        for (product, quantity) in validated {
            match self.items.insert(LineItem::new(*product, *quantity)).await {
                Ok(item) => created.push(item.id),
                Err(source) => {
                    self.compensate(&created).await;
                    return Err(OrderError::PersistenceFailed { source }.into());
                }
            }
        }

        // Aggregated: re-fetch each persisted item together with its price.
        let mut subtotals = Vec::with_capacity(created.len());
        for id in &created {
            let item = match self.items.get(id).await {
                Ok(Some(item)) => item,
                Ok(None) => {
                    self.compensate(&created).await;
                    return Err(ApiError::Internal(format!(
                        "line item {id} vanished between persist and aggregate"
                    )));
                }
                Err(source) => {
                    self.compensate(&created).await;
                    return Err(OrderError::PersistenceFailed { source }.into());
                }
            };

            let unit_price = match self.resolve_price(&item.product).await {
                Ok(unit_price) => unit_price,
                Err(e) => {
                    self.compensate(&created).await;
                    return Err(e);
                }
            };

            match pricing::subtotal(unit_price, item.quantity) {
                Some(subtotal) => subtotals.push(subtotal),
                None => {
                    self.compensate(&created).await;
                    return Err(OrderError::TotalOverflow.into());
                }
            }
        }

        let total = match pricing::total(subtotals) {
            Some(total) => total,
            None => {
                self.compensate(&created).await;
                return Err(OrderError::TotalOverflow.into());
            }
        };

        // Persisted.
        let order = Order::new(
            created.clone(),
            request.shipping.clone(),
            request.status.clone(),
            total,
            request.user,
        );

        match self.orders.insert(order).await {
            Ok(order) => Ok(order),
            Err(source) => {
                self.compensate(&created).await;
                Err(OrderError::PersistenceFailed { source }.into())
            }
        }
    }

    /// Resolve a unit price, mapping a catalog miss to the workflow's
    /// error vocabulary.
    async fn resolve_price(&self, product: &Uuid) -> Result<Decimal, ApiError> {
        match self.catalog.price_of(product).await {
            Ok(price) => Ok(price),
            Err(CatalogError::NotFound { id }) => {
                Err(OrderError::InvalidReference { product: id }.into())
            }
            Err(CatalogError::Storage(e)) => Err(e.into()),
        }
    }

    /// Best-effort removal of line items created by a failed attempt.
    /// Failures here are logged, not surfaced; the original error wins.
    async fn compensate(&self, item_ids: &[Uuid]) {
        for id in item_ids {
            if let Err(e) = self.items.delete(id).await {
                warn!(item = %id, error = %e, "failed to compensate line item");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get(&self, id: &Uuid) -> Result<Order, ApiError> {
        match self.orders.get(id).await? {
            Some(order) => Ok(order),
            None => Err(OrderError::NotFound { id: *id }.into()),
        }
    }

    /// All orders, newest first.
    pub async fn list(&self) -> Result<Vec<Order>, ApiError> {
        Ok(self.orders.list().await?)
    }

    /// A user's orders, newest first.
    pub async fn list_for_user(&self, user: &Uuid) -> Result<Vec<Order>, ApiError> {
        Ok(self.orders.list_by_user(user).await?)
    }

    pub async fn count(&self) -> Result<u64, ApiError> {
        Ok(self.orders.count().await?)
    }

    /// Sum of every stored order's `total_price`.
    pub async fn total_sales(&self) -> Result<Decimal, ApiError> {
        Ok(self.orders.total_sales().await?)
    }

    /// Fetch a line item referenced by an order.
    pub async fn line_item(&self, id: &Uuid) -> Result<LineItem, ApiError> {
        match self.items.get(id).await? {
            Some(item) => Ok(item),
            None => Err(OrderError::ItemNotFound { id: *id }.into()),
        }
    }

    // -----------------------------------------------------------------------
    // Mutation and deletion
    // -----------------------------------------------------------------------

    /// Update only the status tag.
    pub async fn update_status(&self, id: &Uuid, status: &str) -> Result<Order, ApiError> {
        match self.orders.update_status(id, status).await {
            Ok(order) => Ok(order),
            Err(crate::storage::StoreError::NotFound { .. }) => {
                Err(OrderError::NotFound { id: *id }.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an order together with every line item it references.
    ///
    /// A mixed outcome — items that would not delete, or an order record
    /// that survived — surfaces as
    /// [`OrderError::PartialCascadeFailure`], never silently.
    pub async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let order = self.get(id).await?;

        let mut remaining_items: Vec<Uuid> = Vec::new();
        for item_id in &order.order_items {
            match self.items.delete(item_id).await {
                // An already-missing item is fine; the goal is absence.
                Ok(_) => {}
                Err(e) => {
                    warn!(item = %item_id, error = %e, "cascade failed to delete line item");
                    remaining_items.push(*item_id);
                }
            }
        }

        let order_removed = match self.orders.delete(id).await {
            Ok(_) => true,
            Err(e) => {
                warn!(order = %id, error = %e, "cascade failed to delete order record");
                false
            }
        };

        if !remaining_items.is_empty() || !order_removed {
            return Err(OrderError::PartialCascadeFailure {
                order: *id,
                remaining_items,
                order_removed,
            }
            .into());
        }

        info!(order = %id, items = order.order_items.len(), "order deleted");
        Ok(())
    }
}
