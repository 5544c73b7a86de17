//! HTTP server binary
//!
//! Wires the MongoDB stores into the application state and serves the API.
//! Configuration comes from `ESHOP_*` environment variables; a `.env` file
//! in the working directory is honored.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eshop::config::AppConfig;
use eshop::storage::{
    MongoCategoryStore, MongoLineItemStore, MongoOrderStore, MongoProductStore, MongoUserStore,
};
use eshop::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("failed to load configuration")?;

    let client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .context("failed to connect to MongoDB")?;
    let database = client.database(&config.database);

    let categories = MongoCategoryStore::new(database.clone());
    let products = MongoProductStore::new(database.clone());
    let users = MongoUserStore::new(database.clone());
    let items = MongoLineItemStore::new(database.clone());
    let orders = MongoOrderStore::new(client, database);

    products
        .ensure_indexes()
        .await
        .context("failed to create product indexes")?;
    users
        .ensure_indexes()
        .await
        .context("failed to create user indexes")?;
    orders
        .ensure_indexes()
        .await
        .context("failed to create order indexes")?;

    let state = AppState::new(
        Arc::new(categories),
        Arc::new(products),
        Arc::new(users),
        Arc::new(items),
        Arc::new(orders),
        &config,
    );

    let app = web::router(state, &config.api_prefix);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, prefix = %config.api_prefix, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
