use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SERVER_STATUS_STOPPED: &str = "stopped";
pub const SERVER_STATUS_RUNNING: &str = "running";

/// A managed game-server container record. Lifecycle of the container
/// itself is out of scope; `status` tracks the requested state.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GameServer {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub status: String,
    pub port: Option<i32>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
