//! User routes: registration, login, and admin-side user management
//!
//! Login and registration are public; listing, counting, creation with an
//! explicit admin flag and deletion are admin-only; a user may read and
//! update their own account. Every response shape strips the password
//! hash ([`UserProfile`]).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::core::auth::{hash_password, verify_password};
use crate::core::error::{ApiError, AuthError, RequestError};
use crate::models::{Address, User, UserProfile};
use crate::storage::StoreError;
use crate::web::AppState;
use crate::web::extract::{AppJson, RequireAdmin, RequireUser};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_one).put(update).delete(remove))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/get/count", get(count))
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    pub phone: String,
    #[serde(flatten)]
    pub address: Address,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserPayload {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    /// Optional on update: omitted means "keep the current password"
    pub password: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(flatten)]
    pub address: Address,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: String,
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterPayload>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    payload.validate().map_err(RequestError::from)?;

    if state.users.find_by_email(&payload.email).await?.is_some() {
        return Err(RequestError::InvalidInput("email is already registered".to_string()).into());
    }

    let user = User::new(
        payload.name,
        payload.email,
        hash_password(&payload.password)?,
        payload.phone,
        // Self-registration never grants the admin role.
        false,
        payload.address,
    );

    let stored = state.users.insert(user).await?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Unknown email and wrong password are indistinguishable to the caller.
    let user = state
        .users
        .find_by_email(&payload.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&user.password_hash, &payload.password)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.issue(&user)?;
    Ok(Json(LoginResponse {
        user: user.email,
        token,
    }))
}

async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

async fn get_one(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    if !auth.can_access(&id) {
        return Err(AuthError::Forbidden.into());
    }

    let user = state
        .users
        .get(&id)
        .await?
        .ok_or(StoreError::NotFound { entity: "user", id })?;
    Ok(Json(user.into()))
}

/// Admin-side creation; unlike `register` this honors `is_admin`.
async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppJson(payload): AppJson<UserPayload>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    payload.validate().map_err(RequestError::from)?;

    let password = payload
        .password
        .as_deref()
        .ok_or_else(|| RequestError::InvalidInput("password is required".to_string()))?;

    if state.users.find_by_email(&payload.email).await?.is_some() {
        return Err(RequestError::InvalidInput("email is already registered".to_string()).into());
    }

    let user = User::new(
        payload.name,
        payload.email,
        hash_password(password)?,
        payload.phone,
        payload.is_admin,
        payload.address,
    );

    let stored = state.users.insert(user).await?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

async fn update(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UserPayload>,
) -> Result<Json<UserProfile>, ApiError> {
    if !auth.can_access(&id) {
        return Err(AuthError::Forbidden.into());
    }
    payload.validate().map_err(RequestError::from)?;

    let existing = state
        .users
        .get(&id)
        .await?
        .ok_or(StoreError::NotFound { entity: "user", id })?;

    let password_hash = match payload.password.as_deref() {
        Some(password) => hash_password(password)?,
        None => existing.password_hash,
    };

    // Only an admin may change the admin flag.
    let is_admin = if auth.0.is_admin {
        payload.is_admin
    } else {
        existing.is_admin
    };

    let updated = User {
        id: existing.id,
        name: payload.name,
        email: payload.email,
        password_hash,
        phone: payload.phone,
        is_admin,
        address: payload.address,
        created_at: existing.created_at,
    };

    let stored = state.users.update(&id, updated).await?;
    Ok(Json(stored.into()))
}

async fn remove(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.users.delete(&id).await? {
        return Err(StoreError::NotFound { entity: "user", id }.into());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn count(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.users.count().await?;
    Ok(Json(json!({ "user_count": count })))
}
