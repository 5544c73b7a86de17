//! Capability extractors
//!
//! Routes state their requirement in the handler signature:
//! [`RequireUser`] for any authenticated caller, [`RequireAdmin`] for the
//! admin role. The workflow core never checks roles itself; it only
//! records the user reference these extractors resolve.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::AppState;
use crate::core::auth::Claims;
use crate::core::error::{ApiError, AuthError, RequestError};

/// JSON request body whose rejection renders as a coded error response,
/// like every other failure in the service, instead of axum's plain-text
/// default.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(RequestError::InvalidInput(rejection.body_text()).into()),
        }
    }
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct RequireUser(pub Claims);

/// A caller holding the admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Claims);

fn claims_from_parts(parts: &Parts, state: &AppState) -> Result<Claims, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    let value = header.to_str().map_err(|_| AuthError::InvalidToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)?;

    Ok(state.tokens.verify(token)?)
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        claims_from_parts(parts, state).map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let claims = claims_from_parts(parts, state)?;
        if !claims.is_admin {
            return Err(AuthError::Forbidden.into());
        }
        Ok(Self(claims))
    }
}

impl RequireUser {
    /// Whether this caller may act on resources owned by `owner`.
    pub fn can_access(&self, owner: &uuid::Uuid) -> bool {
        self.0.is_admin || &self.0.sub == owner
    }
}
