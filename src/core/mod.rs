//! Core concerns shared across the service: the error taxonomy and the
//! authentication primitives (tokens and password hashing).

pub mod auth;
pub mod error;

pub use auth::{Claims, TokenService, hash_password, verify_password};
pub use error::{ApiError, AuthError, CatalogError, OrderError, RequestError};
