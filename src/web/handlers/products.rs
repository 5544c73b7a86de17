//! Product catalog routes
//!
//! Reads are public; mutations require the admin role. Product responses
//! expand the category reference into the full category document.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{ApiError, RequestError};
use crate::models::{Category, Product};
use crate::storage::StoreError;
use crate::web::AppState;
use crate::web::extract::{AppJson, RequireAdmin};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_one).put(update).delete(remove))
        .route("/get/count", get(count))
        .route("/get/featured/{count}", get(featured))
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct ProductPayload {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rich_description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub brand: String,
    pub price: Decimal,
    pub category: Uuid,
    #[serde(default)]
    pub count_in_stock: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: i64,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Comma-separated category ids
    pub categories: Option<String>,
}

/// A product with its category reference expanded.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub rich_description: String,
    pub image: String,
    pub images: Vec<String>,
    pub brand: String,
    pub price: Decimal,
    pub category: Option<Category>,
    pub count_in_stock: i64,
    pub rating: f64,
    pub num_reviews: i64,
    pub is_featured: bool,
    pub created_at: chrono::DateTime<Utc>,
}

impl ProductView {
    pub fn assemble(product: Product, category: Option<Category>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            rich_description: product.rich_description,
            image: product.image,
            images: product.images,
            brand: product.brand,
            price: product.price,
            category,
            count_in_stock: product.count_in_stock,
            rating: product.rating,
            num_reviews: product.num_reviews,
            is_featured: product.is_featured,
            created_at: product.created_at,
        }
    }
}

fn payload_into_product(payload: ProductPayload, id: Uuid, created_at: chrono::DateTime<Utc>) -> Product {
    Product {
        id,
        name: payload.name,
        description: payload.description,
        rich_description: payload.rich_description,
        image: payload.image,
        images: payload.images,
        brand: payload.brand,
        price: payload.price,
        category: payload.category,
        count_in_stock: payload.count_in_stock,
        rating: payload.rating,
        num_reviews: payload.num_reviews,
        is_featured: payload.is_featured,
        created_at,
    }
}

async fn check_payload(state: &AppState, payload: &ProductPayload) -> Result<(), ApiError> {
    payload.validate().map_err(RequestError::from)?;

    if payload.price < Decimal::ZERO {
        return Err(RequestError::InvalidInput("price must be non-negative".to_string()).into());
    }

    if state.categories.get(&payload.category).await?.is_none() {
        return Err(RequestError::InvalidInput(format!(
            "category {} does not exist",
            payload.category
        ))
        .into());
    }

    Ok(())
}

/// Expand a batch of products against a single snapshot of the categories
/// collection.
async fn expand_all(state: &AppState, products: Vec<Product>) -> Result<Vec<ProductView>, ApiError> {
    let categories: HashMap<Uuid, Category> = state
        .categories
        .list()
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    Ok(products
        .into_iter()
        .map(|p| {
            let category = categories.get(&p.category).cloned();
            ProductView::assemble(p, category)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    let categories = match &query.categories {
        Some(raw) => {
            let parsed: Result<Vec<Uuid>, _> = raw.split(',').map(Uuid::parse_str).collect();
            Some(parsed.map_err(|_| {
                RequestError::InvalidInput("categories must be comma-separated ids".to_string())
            })?)
        }
        None => None,
    };

    let products = state.products.list(categories.as_deref()).await?;
    Ok(Json(expand_all(&state, products).await?))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, ApiError> {
    let product = state.products.get(&id).await?.ok_or(StoreError::NotFound {
        entity: "product",
        id,
    })?;
    let category = state.categories.get(&product.category).await?;
    Ok(Json(ProductView::assemble(product, category)))
}

async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppJson(payload): AppJson<ProductPayload>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    check_payload(&state, &payload).await?;

    let product = payload_into_product(payload, Uuid::new_v4(), Utc::now());
    let stored = state.products.insert(product).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<ProductPayload>,
) -> Result<Json<Product>, ApiError> {
    check_payload(&state, &payload).await?;

    let existing = state.products.get(&id).await?.ok_or(StoreError::NotFound {
        entity: "product",
        id,
    })?;

    let updated = payload_into_product(payload, existing.id, existing.created_at);
    Ok(Json(state.products.update(&id, updated).await?))
}

async fn remove(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.products.delete(&id).await? {
        return Err(StoreError::NotFound {
            entity: "product",
            id,
        }
        .into());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn count(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.products.count().await?;
    Ok(Json(json!({ "product_count": count })))
}

async fn featured(
    State(state): State<AppState>,
    Path(count): Path<usize>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.products.featured(count).await?))
}
