//! Order routes
//!
//! Creation is open to any authenticated user; the user reference on the
//! stored order always comes from the bearer token, never the body.
//! Listing everything, changing status and deleting are admin-only; a
//! user may read their own orders.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::core::error::{ApiError, AuthError, RequestError};
use crate::models::{Order, ShippingDetails, UserProfile};
use crate::orders::{NewOrder, NewOrderItem};
use crate::web::AppState;
use crate::web::extract::{AppJson, RequireAdmin, RequireUser};
use crate::web::handlers::products::ProductView;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_one).put(update_status).delete(remove))
        .route("/get/count", get(count))
        .route("/get/totalsales", get(total_sales))
        .route("/get/userorders/{user_id}", get(user_orders))
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OrderItemPayload {
    pub product: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrderPayload {
    pub order_items: Vec<OrderItemPayload>,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: String,
}

/// A listed order with the placing user's name resolved.
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub user_name: Option<String>,
}

/// A line item with its product reference expanded. The product is `None`
/// when the catalog entry has since been deleted.
#[derive(Debug, Serialize)]
pub struct ExpandedItem {
    pub id: Uuid,
    pub quantity: u32,
    pub product: Option<ProductView>,
}

/// A single order with items and user expanded.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_items: Vec<ExpandedItem>,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    pub status: String,
    pub total_price: Decimal,
    pub user: Option<UserProfile>,
    pub created_at: DateTime<Utc>,
}

async fn expand_order(state: &AppState, order: Order) -> Result<OrderDetail, ApiError> {
    let mut order_items = Vec::with_capacity(order.order_items.len());
    for item_id in &order.order_items {
        let item = state.workflow.line_item(item_id).await?;
        let product = match state.products.get(&item.product).await? {
            Some(product) => {
                let category = state.categories.get(&product.category).await?;
                Some(ProductView::assemble(product, category))
            }
            None => None,
        };
        order_items.push(ExpandedItem {
            id: item.id,
            quantity: item.quantity,
            product,
        });
    }

    let user = state.users.get(&order.user).await?.map(UserProfile::from);

    Ok(OrderDetail {
        id: order.id,
        order_items,
        shipping: order.shipping,
        status: order.status,
        total_price: order.total_price,
        user,
        created_at: order.created_at,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create(
    State(state): State<AppState>,
    auth: RequireUser,
    AppJson(payload): AppJson<OrderPayload>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let request = NewOrder {
        items: payload
            .order_items
            .into_iter()
            .map(|item| NewOrderItem {
                product: item.product,
                quantity: item.quantity,
            })
            .collect(),
        shipping: payload.shipping,
        status: payload.status,
        user: auth.0.sub,
    };

    let order = state.workflow.create(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// All orders, newest first, with the placing user's name.
async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<OrderSummary>>, ApiError> {
    let orders = state.workflow.list().await?;

    let mut summaries = Vec::with_capacity(orders.len());
    for order in orders {
        let user_name = state.users.get(&order.user).await?.map(|u| u.name);
        summaries.push(OrderSummary { order, user_name });
    }
    Ok(Json(summaries))
}

async fn get_one(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, ApiError> {
    let order = state.workflow.get(&id).await?;
    if !auth.can_access(&order.user) {
        return Err(AuthError::Forbidden.into());
    }
    Ok(Json(expand_order(&state, order).await?))
}

async fn update_status(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<StatusPayload>,
) -> Result<Json<Order>, ApiError> {
    if payload.status.trim().is_empty() {
        return Err(RequestError::InvalidInput("status must not be empty".to_string()).into());
    }
    Ok(Json(state.workflow.update_status(&id, &payload.status).await?))
}

async fn remove(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.workflow.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn count(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.workflow.count().await?;
    Ok(Json(json!({ "order_count": count })))
}

async fn total_sales(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<serde_json::Value>, ApiError> {
    let total = state.workflow.total_sales().await?;
    Ok(Json(json!({ "total_sales": total })))
}

/// A user's own orders, expanded, newest first.
async fn user_orders(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<OrderDetail>>, ApiError> {
    if !auth.can_access(&user_id) {
        return Err(AuthError::Forbidden.into());
    }

    let orders = state.workflow.list_for_user(&user_id).await?;
    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        details.push(expand_order(&state, order).await?);
    }
    Ok(Json(details))
}
