use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State kept for one live access token, keyed by its JTI. Created and
/// deleted wholesale by the session store, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(user_id: i64, ip_address: String, user_agent: String) -> Self {
        Self {
            user_id,
            ip_address,
            user_agent,
            created_at: Utc::now(),
        }
    }
}
