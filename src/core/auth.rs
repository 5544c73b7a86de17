//! Token issuing/verification and password hashing
//!
//! Bearer tokens are HS256 JWTs carrying the user id and admin flag; the
//! secret comes from [`crate::config::AppConfig`]. Passwords are hashed
//! with argon2 and a per-hash random salt.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::AuthError;
use crate::models::User;

/// Claims carried by every issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    /// Whether the user holds the admin role
    pub is_admin: bool,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a token for a user.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            is_admin: user.is_admin,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Verify a token and return its claims.
    ///
    /// Expired, malformed and wrongly-signed tokens all report
    /// [`AuthError::InvalidToken`]; the distinction is not leaked to callers.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Hash a plain-text password with argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a plain-text password against a stored argon2 hash.
///
/// Returns `Ok(false)` on a mismatch; `Err` only for malformed hashes or
/// internal hasher failures.
pub fn verify_password(stored_hash: &str, password: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Hashing(e.to_string())),
    }
}
