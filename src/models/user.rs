//! User accounts
//!
//! `User` is the persisted shape, password hash included. Anything leaving
//! the service goes through [`UserProfile`], which strips the hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Postal address fields, stored flattened on the user document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub apartment: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2 hash; never serialized in API responses (see [`UserProfile`])
    pub password_hash: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(flatten)]
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        phone: String,
        is_admin: bool,
        address: Address,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            phone,
            is_admin,
            address,
            created_at: Utc::now(),
        }
    }
}

/// Public view of a user, safe to serialize in responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_admin: bool,
    #[serde(flatten)]
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            is_admin: user.is_admin,
            address: user.address,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_never_exposes_the_password_hash() {
        let user = User::new(
            "Jane".to_string(),
            "jane@example.com".to_string(),
            "$argon2id$secret".to_string(),
            String::new(),
            false,
            Address::default(),
        );

        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "jane@example.com");
    }
}
