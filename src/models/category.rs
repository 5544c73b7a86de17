//! Product categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// Icon identifier used by the storefront (opaque to the backend)
    #[serde(default)]
    pub icon: Option<String>,
    /// Display color, e.g. `#55879a` (opaque to the backend)
    #[serde(default)]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: String, icon: Option<String>, color: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            icon,
            color,
            created_at: Utc::now(),
        }
    }
}
