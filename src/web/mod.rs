//! HTTP layer: application state, routing and auth extractors
//!
//! Handlers translate between request/response shapes and the stores or
//! the order workflow; every failure they return is an
//! [`crate::core::ApiError`] and renders as a stable error code.

pub mod extract;
pub mod handlers;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::core::TokenService;
use crate::orders::{OrderWorkflow, WorkflowOptions};
use crate::storage::{CategoryStore, LineItemStore, OrderStore, ProductStore, UserStore};

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub categories: Arc<dyn CategoryStore>,
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
    pub items: Arc<dyn LineItemStore>,
    pub workflow: Arc<OrderWorkflow>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(
        categories: Arc<dyn CategoryStore>,
        products: Arc<dyn ProductStore>,
        users: Arc<dyn UserStore>,
        items: Arc<dyn LineItemStore>,
        orders: Arc<dyn OrderStore>,
        config: &AppConfig,
    ) -> Self {
        let workflow = OrderWorkflow::new(
            orders,
            items.clone(),
            products.clone(),
            WorkflowOptions {
                strict_product_refs: config.strict_product_refs,
                write_mode: config.order_write_mode,
            },
        );

        Self {
            categories,
            products,
            users,
            items,
            workflow: Arc::new(workflow),
            tokens: Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl_hours)),
        }
    }
}

/// Build the application router with all routes nested under `api_prefix`.
pub fn router(state: AppState, api_prefix: &str) -> Router {
    let api = Router::new()
        .nest("/categories", handlers::categories::routes())
        .nest("/products", handlers::products::routes())
        .nest("/users", handlers::users::routes())
        .nest("/orders", handlers::orders::routes());

    Router::new()
        .nest(api_prefix, api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
