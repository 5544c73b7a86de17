//! Category CRUD
//!
//! Reads are public; mutations require the admin role.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{ApiError, RequestError};
use crate::models::Category;
use crate::storage::StoreError;
use crate::web::AppState;
use crate::web::extract::{AppJson, RequireAdmin};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_one).put(update).delete(remove))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryPayload {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.categories.list().await?))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
    let category = state.categories.get(&id).await?.ok_or(StoreError::NotFound {
        entity: "category",
        id,
    })?;
    Ok(Json(category))
}

async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppJson(payload): AppJson<CategoryPayload>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    payload.validate().map_err(RequestError::from)?;

    let category = state
        .categories
        .insert(Category::new(payload.name, payload.icon, payload.color))
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<CategoryPayload>,
) -> Result<Json<Category>, ApiError> {
    payload.validate().map_err(RequestError::from)?;

    let existing = state.categories.get(&id).await?.ok_or(StoreError::NotFound {
        entity: "category",
        id,
    })?;

    let updated = Category {
        id: existing.id,
        name: payload.name,
        icon: payload.icon,
        color: payload.color,
        created_at: existing.created_at,
    };
    Ok(Json(state.categories.update(&id, updated).await?))
}

async fn remove(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.categories.delete(&id).await? {
        return Err(StoreError::NotFound {
            entity: "category",
            id,
        }
        .into());
    }
    Ok(StatusCode::NO_CONTENT)
}
