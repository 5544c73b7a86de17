//! Typed error handling for the service
//!
//! Every failure a caller can observe is one of the specific kinds below,
//! never a generic error: a client must always be able to distinguish
//! "bad input" from "the system could not complete the operation".
//!
//! # Error categories
//!
//! - [`OrderError`]: the order workflow (creation, cascade deletion, lookups)
//! - [`CatalogError`]: read-only product/price resolution
//! - [`AuthError`]: bearer tokens, credentials and role checks
//! - [`RequestError`]: request shapes rejected before any storage call
//! - [`crate::storage::StoreError`]: storage backend failures
//!
//! Each kind carries a stable machine-readable code and maps to a fixed
//! HTTP status; the axum layer renders them through [`ErrorResponse`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::StoreError;

/// The top-level error type surfaced by handlers and the order workflow.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Order workflow failures
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Catalog lookup failures
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Authentication and authorization failures
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Malformed or invalid request input
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Storage backend failures
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Internal invariant violations (should not happen in normal operation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors raised by the order workflow.
#[derive(Debug, Error)]
pub enum OrderError {
    /// An order was submitted with no line items at all.
    #[error("order contains no line items")]
    Empty,

    /// A line item carried a zero or negative quantity.
    #[error("invalid quantity {quantity} for product {product}")]
    InvalidQuantity { product: Uuid, quantity: i64 },

    /// A line item referenced a product that does not exist.
    #[error("product {product} does not exist")]
    InvalidReference { product: Uuid },

    /// Aggregation produced a value outside the representable price range.
    #[error("order total exceeds the representable price range")]
    TotalOverflow,

    /// The requested order does not exist.
    #[error("order {id} not found")]
    NotFound { id: Uuid },

    /// A line item id recorded on an order does not resolve.
    #[error("line item {id} not found")]
    ItemNotFound { id: Uuid },

    /// Storage rejected a write after the workflow had started; any line
    /// items created up to that point have been compensated for.
    #[error("order could not be persisted")]
    PersistenceFailed {
        #[source]
        source: StoreError,
    },

    /// Cascade deletion left a mixed state behind: either line items
    /// survived, or the order record itself did.
    #[error("order {order} was only partially deleted")]
    PartialCascadeFailure {
        order: Uuid,
        /// Line items that could not be removed
        remaining_items: Vec<Uuid>,
        /// Whether the order record itself was removed
        order_removed: bool,
    },
}

/// Errors raised by catalog price lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product {id} not found in catalog")]
    NotFound { id: Uuid },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Authentication and authorization errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid or expired bearer token")]
    InvalidToken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("insufficient permissions for this operation")]
    Forbidden,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Request input rejected before entering the workflow or stores.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Declarative field validation failed (lengths, formats, ranges).
    #[error("invalid request body")]
    FieldErrors(#[from] validator::ValidationErrors),

    /// The request shape was wrong in a way field validators cannot express.
    #[error("{0}")]
    InvalidInput(String),
}

/// JSON body rendered for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable code for programmatic handling
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Order(e) => e.status_code(),
            ApiError::Catalog(CatalogError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Catalog(CatalogError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(e) => e.status_code(),
            ApiError::Request(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Order(e) => e.error_code(),
            ApiError::Catalog(CatalogError::NotFound { .. }) => "NOT_FOUND",
            ApiError::Catalog(CatalogError::Storage(_)) => "STORAGE_ERROR",
            ApiError::Auth(e) => e.error_code(),
            ApiError::Request(_) => "INVALID_INPUT",
            ApiError::Storage(StoreError::NotFound { .. }) => "NOT_FOUND",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert into the response body.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Order(OrderError::InvalidQuantity { product, quantity }) => {
                Some(serde_json::json!({
                    "product": product.to_string(),
                    "quantity": quantity,
                }))
            }
            ApiError::Order(OrderError::InvalidReference { product }) => {
                Some(serde_json::json!({ "product": product.to_string() }))
            }
            ApiError::Order(OrderError::PartialCascadeFailure {
                order,
                remaining_items,
                order_removed,
            }) => Some(serde_json::json!({
                "order": order.to_string(),
                "remaining_items": remaining_items.iter().map(Uuid::to_string).collect::<Vec<_>>(),
                "order_removed": order_removed,
            })),
            ApiError::Request(RequestError::FieldErrors(errors)) => {
                serde_json::to_value(errors).ok()
            }
            _ => None,
        }
    }
}

impl OrderError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OrderError::Empty | OrderError::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
            OrderError::InvalidReference { .. } | OrderError::TotalOverflow => {
                StatusCode::BAD_REQUEST
            }
            OrderError::NotFound { .. } | OrderError::ItemNotFound { .. } => StatusCode::NOT_FOUND,
            OrderError::PersistenceFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            OrderError::PartialCascadeFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OrderError::Empty => "EMPTY_ORDER",
            OrderError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            OrderError::InvalidReference { .. } => "INVALID_REFERENCE",
            OrderError::TotalOverflow => "TOTAL_OVERFLOW",
            OrderError::NotFound { .. } | OrderError::ItemNotFound { .. } => "NOT_FOUND",
            OrderError::PersistenceFailed { .. } => "ORDER_PERSISTENCE_FAILED",
            OrderError::PartialCascadeFailure { .. } => "PARTIAL_CASCADE_FAILURE",
        }
    }
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::Hashing(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }
        (status, Json(self.to_response())).into_response()
    }
}
