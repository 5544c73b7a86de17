//! Order workflow tests over the in-memory stores
//!
//! Cover creation in both write modes, validation rejections, the
//! compensation path, the deletion cascade and the read-side aggregates.

mod harness;

use harness::*;

use rust_decimal_macros::dec;
use uuid::Uuid;

use eshop::core::error::{ApiError, OrderError};
use eshop::orders::{WorkflowOptions, WriteMode};
use eshop::storage::{CategoryStore, LineItemStore, OrderStore, ProductStore};

fn sequential() -> WorkflowOptions {
    WorkflowOptions {
        write_mode: WriteMode::Sequential,
        ..WorkflowOptions::default()
    }
}

fn non_strict(write_mode: WriteMode) -> WorkflowOptions {
    WorkflowOptions {
        strict_product_refs: false,
        write_mode,
    }
}

#[tokio::test]
async fn order_total_is_the_sum_of_line_subtotals() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let widget = stores
        .products
        .insert(product("widget", dec!(9.99), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(WorkflowOptions::default());
    let order = workflow
        .create(new_order(Uuid::new_v4(), &[(widget.id, 3)]))
        .await
        .unwrap();

    assert_eq!(order.total_price, dec!(29.97));
    assert_eq!(order.order_items.len(), 1);
    assert_eq!(order.status, "pending");
}

#[tokio::test]
async fn multi_item_totals_are_exact() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let a = stores
        .products
        .insert(product("a", dec!(10.00), cat.id))
        .await
        .unwrap();
    let b = stores
        .products
        .insert(product("b", dec!(5.50), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(WorkflowOptions::default());
    let order = workflow
        .create(new_order(Uuid::new_v4(), &[(a.id, 2), (b.id, 1)]))
        .await
        .unwrap();

    assert_eq!(order.total_price, dec!(25.50));
    assert_eq!(order.order_items.len(), 2);
}

#[tokio::test]
async fn empty_order_is_rejected_before_any_write() {
    let stores = TestStores::new();
    let workflow = stores.workflow(WorkflowOptions::default());

    let result = workflow.create(new_order(Uuid::new_v4(), &[])).await;
    assert!(matches!(
        result,
        Err(ApiError::Order(OrderError::Empty))
    ));
    assert!(stores.items.is_empty());
    assert_eq!(stores.orders.count().await.unwrap(), 0);
}

#[tokio::test]
async fn zero_quantity_is_rejected_before_any_write() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let widget = stores
        .products
        .insert(product("widget", dec!(1.00), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(WorkflowOptions::default());
    let result = workflow
        .create(new_order(Uuid::new_v4(), &[(widget.id, 0)]))
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Order(OrderError::InvalidQuantity { quantity: 0, .. }))
    ));
    assert!(stores.items.is_empty());
}

#[tokio::test]
async fn unknown_product_reference_is_rejected_when_strict() {
    let stores = TestStores::new();
    let workflow = stores.workflow(WorkflowOptions::default());
    let ghost = Uuid::new_v4();

    let result = workflow
        .create(new_order(Uuid::new_v4(), &[(ghost, 1)]))
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Order(OrderError::InvalidReference { product })) if product == ghost
    ));
    assert!(stores.items.is_empty());
}

#[tokio::test]
async fn non_strict_atomic_still_fails_at_aggregation_with_nothing_persisted() {
    let stores = TestStores::new();
    let workflow = stores.workflow(non_strict(WriteMode::Atomic));
    let ghost = Uuid::new_v4();

    // Without up-front checking the bad reference survives validation and
    // only fails when its price cannot be resolved.
    let result = workflow
        .create(new_order(Uuid::new_v4(), &[(ghost, 1)]))
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Order(OrderError::InvalidReference { product })) if product == ghost
    ));
    assert!(stores.items.is_empty());
    assert_eq!(stores.orders.count().await.unwrap(), 0);
}

#[tokio::test]
async fn non_strict_sequential_compensates_items_for_an_unknown_reference() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let widget = stores
        .products
        .insert(product("widget", dec!(2.00), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(non_strict(WriteMode::Sequential));
    let ghost = Uuid::new_v4();

    // Both items are persisted before aggregation discovers the bad
    // reference; compensation must remove them again.
    let result = workflow
        .create(new_order(Uuid::new_v4(), &[(widget.id, 1), (ghost, 1)]))
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Order(OrderError::InvalidReference { product })) if product == ghost
    ));
    assert!(stores.items.is_empty());
    assert_eq!(stores.orders.count().await.unwrap(), 0);
}

#[tokio::test]
async fn atomic_mode_leaves_nothing_behind_when_the_write_fails() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let widget = stores
        .products
        .insert(product("widget", dec!(9.99), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow_with_broken_order_writes(WorkflowOptions::default());
    let result = workflow
        .create(new_order(Uuid::new_v4(), &[(widget.id, 2)]))
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Order(OrderError::PersistenceFailed { .. }))
    ));
    assert!(stores.items.is_empty());
    assert_eq!(stores.orders.count().await.unwrap(), 0);
}

#[tokio::test]
async fn sequential_mode_compensates_created_items_on_failure() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let a = stores
        .products
        .insert(product("a", dec!(3.00), cat.id))
        .await
        .unwrap();
    let b = stores
        .products
        .insert(product("b", dec!(4.00), cat.id))
        .await
        .unwrap();

    // Line item writes succeed; the final order write fails.
    let workflow = stores.workflow_with_broken_order_writes(sequential());
    let result = workflow
        .create(new_order(Uuid::new_v4(), &[(a.id, 1), (b.id, 2)]))
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Order(OrderError::PersistenceFailed { .. }))
    ));
    // Every created line item was deleted again.
    assert!(stores.items.is_empty());
}

#[tokio::test]
async fn sequential_mode_produces_the_same_total_as_atomic() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let widget = stores
        .products
        .insert(product("widget", dec!(9.99), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(sequential());
    let order = workflow
        .create(new_order(Uuid::new_v4(), &[(widget.id, 3)]))
        .await
        .unwrap();

    assert_eq!(order.total_price, dec!(29.97));
    // Items were actually persisted, in submission order.
    assert_eq!(stores.items.len(), 1);
    let item = stores.items.get(&order.order_items[0]).await.unwrap().unwrap();
    assert_eq!(item.product, widget.id);
    assert_eq!(item.quantity, 3);
}

#[tokio::test]
async fn total_is_a_snapshot_unaffected_by_later_price_changes() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let mut widget = stores
        .products
        .insert(product("widget", dec!(10.00), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(WorkflowOptions::default());
    let order = workflow
        .create(new_order(Uuid::new_v4(), &[(widget.id, 1)]))
        .await
        .unwrap();

    widget.price = dec!(99.00);
    stores.products.update(&widget.id, widget.clone()).await.unwrap();

    let reread = workflow.get(&order.id).await.unwrap();
    assert_eq!(reread.total_price, dec!(10.00));
}

#[tokio::test]
async fn delete_cascades_to_line_items() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let widget = stores
        .products
        .insert(product("widget", dec!(2.00), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(WorkflowOptions::default());
    let order = workflow
        .create(new_order(Uuid::new_v4(), &[(widget.id, 2)]))
        .await
        .unwrap();
    let item_id = order.order_items[0];
    assert!(stores.items.get(&item_id).await.unwrap().is_some());

    workflow.delete(&order.id).await.unwrap();

    assert!(stores.items.get(&item_id).await.unwrap().is_none());
    assert!(matches!(
        workflow.get(&order.id).await,
        Err(ApiError::Order(OrderError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn surviving_order_record_surfaces_as_partial_cascade_failure() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let widget = stores
        .products
        .insert(product("widget", dec!(4.00), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(WorkflowOptions::default());
    let order = workflow
        .create(new_order(Uuid::new_v4(), &[(widget.id, 1)]))
        .await
        .unwrap();

    // Item deletes go through; the order-record delete is refused.
    let broken = stores.workflow_with_broken_order_writes(WorkflowOptions::default());
    let result = broken.delete(&order.id).await;

    match result {
        Err(ApiError::Order(OrderError::PartialCascadeFailure {
            order: failed,
            remaining_items,
            order_removed,
        })) => {
            assert_eq!(failed, order.id);
            assert!(remaining_items.is_empty());
            assert!(!order_removed);
        }
        other => panic!("expected PartialCascadeFailure, got {other:?}"),
    }

    // The mixed outcome is real: items are gone, the record survived.
    assert!(stores.items.is_empty());
    assert!(stores.orders.get(&order.id).await.unwrap().is_some());
}

#[tokio::test]
async fn overflowing_totals_are_rejected_without_persisting() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let absurd = stores
        .products
        .insert(product("absurd", rust_decimal::Decimal::MAX, cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(WorkflowOptions::default());
    let result = workflow
        .create(new_order(Uuid::new_v4(), &[(absurd.id, 2)]))
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Order(OrderError::TotalOverflow))
    ));
    assert!(stores.items.is_empty());
    assert_eq!(stores.orders.count().await.unwrap(), 0);
}

#[tokio::test]
async fn sequential_overflow_compensates_created_items() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let absurd = stores
        .products
        .insert(product("absurd", rust_decimal::Decimal::MAX, cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(sequential());
    let result = workflow
        .create(new_order(Uuid::new_v4(), &[(absurd.id, 2)]))
        .await;

    assert!(matches!(
        result,
        Err(ApiError::Order(OrderError::TotalOverflow))
    ));
    assert!(stores.items.is_empty());
}

#[tokio::test]
async fn deleting_a_missing_order_reports_not_found() {
    let stores = TestStores::new();
    let workflow = stores.workflow(WorkflowOptions::default());

    let result = workflow.delete(&Uuid::new_v4()).await;
    assert!(matches!(
        result,
        Err(ApiError::Order(OrderError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn listings_are_newest_first_and_filter_by_user() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let widget = stores
        .products
        .insert(product("widget", dec!(1.00), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(WorkflowOptions::default());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let first = workflow.create(new_order(alice, &[(widget.id, 1)])).await.unwrap();
    let second = workflow.create(new_order(bob, &[(widget.id, 1)])).await.unwrap();
    let third = workflow.create(new_order(alice, &[(widget.id, 1)])).await.unwrap();

    let all = workflow.list().await.unwrap();
    assert_eq!(all.len(), 3);
    // Newest first; the first created order comes last.
    assert_eq!(all.last().unwrap().id, first.id);

    let alices = workflow.list_for_user(&alice).await.unwrap();
    let ids: Vec<Uuid> = alices.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![third.id, first.id]);
    let _ = second;
}

#[tokio::test]
async fn aggregates_match_a_direct_recomputation() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let a = stores
        .products
        .insert(product("a", dec!(10.00), cat.id))
        .await
        .unwrap();
    let b = stores
        .products
        .insert(product("b", dec!(5.50), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(WorkflowOptions::default());
    let user = Uuid::new_v4();
    workflow.create(new_order(user, &[(a.id, 3)])).await.unwrap();
    workflow
        .create(new_order(user, &[(a.id, 2), (b.id, 1)]))
        .await
        .unwrap();

    assert_eq!(workflow.count().await.unwrap(), 2);

    let expected: rust_decimal::Decimal = workflow
        .list()
        .await
        .unwrap()
        .iter()
        .map(|o| o.total_price)
        .sum();
    assert_eq!(workflow.total_sales().await.unwrap(), expected);
    assert_eq!(expected, dec!(55.50));
}

#[tokio::test]
async fn status_can_be_updated_without_touching_the_rest() {
    let stores = TestStores::new();
    let cat = stores.categories.insert(category("toys")).await.unwrap();
    let widget = stores
        .products
        .insert(product("widget", dec!(7.00), cat.id))
        .await
        .unwrap();

    let workflow = stores.workflow(WorkflowOptions::default());
    let order = workflow
        .create(new_order(Uuid::new_v4(), &[(widget.id, 1)]))
        .await
        .unwrap();

    let updated = workflow.update_status(&order.id, "shipped").await.unwrap();
    assert_eq!(updated.status, "shipped");
    assert_eq!(updated.total_price, order.total_price);
    assert_eq!(updated.order_items, order.order_items);
}
