use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog entry for an installable server mod. The catalog is shared
/// reference data; which server runs which mod is out of scope here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GameMod {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub source_url: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
