use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resource and action of the permission that satisfies every check.
/// This bypass is carried as an ordinary data row, not a code path.
pub const ADMIN_BYPASS_RESOURCE: &str = "system";
pub const ADMIN_BYPASS_ACTION: &str = "admin";

/// A named, prioritized bundle of permissions. Every user has exactly
/// one role.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub priority: i32,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An exact (resource, action) pair. No wildcards.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: i64,
    pub resource: String,
    pub action: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn is_admin_bypass(&self) -> bool {
        self.resource == ADMIN_BYPASS_RESOURCE && self.action == ADMIN_BYPASS_ACTION
    }
}
